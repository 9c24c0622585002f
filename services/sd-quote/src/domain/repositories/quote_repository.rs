//! 报价单仓储接口

use async_trait::async_trait;
use cpq_common::TenantId;
use cpq_errors::AppResult;

use crate::domain::entities::{NewQuote, Quote};
use crate::domain::value_objects::QuoteId;

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn find_by_id(&self, tenant_id: &TenantId, id: QuoteId) -> AppResult<Option<Quote>>;

    /// 读取并锁定报价单，同一报价单的并发转换在此串行化
    async fn find_for_update(&self, tenant_id: &TenantId, id: QuoteId) -> AppResult<Option<Quote>>;

    async fn insert(&self, tenant_id: &TenantId, quote: &NewQuote) -> AppResult<QuoteId>;
}
