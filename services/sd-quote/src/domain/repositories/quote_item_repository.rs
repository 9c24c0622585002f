//! 报价行仓储接口

use async_trait::async_trait;
use cpq_common::TenantId;
use cpq_errors::AppResult;

use crate::domain::entities::{NewQuoteItem, QuoteItem, QuoteItemUpdate};
use crate::domain::value_objects::QuoteId;

#[async_trait]
pub trait QuoteItemRepository: Send + Sync {
    async fn find_by_quote(&self, tenant_id: &TenantId, quote_id: QuoteId) -> AppResult<Vec<QuoteItem>>;

    async fn find_selected(&self, tenant_id: &TenantId, quote_id: QuoteId) -> AppResult<Vec<QuoteItem>>;

    async fn insert_batch(
        &self,
        tenant_id: &TenantId,
        quote_id: QuoteId,
        items: &[NewQuoteItem],
    ) -> AppResult<()>;

    /// 返回是否命中了报价单下的行
    async fn update(
        &self,
        tenant_id: &TenantId,
        quote_id: QuoteId,
        update: &QuoteItemUpdate,
    ) -> AppResult<bool>;
}
