//! 报价备注仓储接口

use async_trait::async_trait;
use cpq_common::{TenantId, UserId};
use cpq_errors::AppResult;

use crate::domain::value_objects::QuoteId;

#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn insert(
        &self,
        tenant_id: &TenantId,
        quote_id: QuoteId,
        content: &str,
        created_by: UserId,
    ) -> AppResult<()>;

    /// 最早的一条备注
    async fn first_for_quote(&self, tenant_id: &TenantId, quote_id: QuoteId) -> AppResult<Option<String>>;
}
