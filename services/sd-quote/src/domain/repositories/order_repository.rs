//! 订单仓储接口

use async_trait::async_trait;
use cpq_common::TenantId;
use cpq_errors::AppResult;

use crate::domain::entities::{DispatchedLine, NewOrder, NewOrderLine};
use crate::domain::value_objects::{AttributeId, OrderId, ProductId, QuoteId};

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 查找该报价单已生成订单行中与给定组合重叠的部分
    async fn find_dispatched(
        &self,
        tenant_id: &TenantId,
        quote_id: QuoteId,
        pairs: &[(ProductId, AttributeId)],
    ) -> AppResult<Vec<DispatchedLine>>;

    async fn insert(&self, tenant_id: &TenantId, order: &NewOrder) -> AppResult<OrderId>;

    /// 单条语句批量插入订单行
    async fn insert_lines(
        &self,
        tenant_id: &TenantId,
        order_id: OrderId,
        quote_id: Option<QuoteId>,
        lines: &[NewOrderLine],
    ) -> AppResult<u64>;
}
