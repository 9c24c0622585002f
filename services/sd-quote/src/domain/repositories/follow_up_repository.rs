//! 跟进仓储接口

use async_trait::async_trait;
use cpq_common::TenantId;
use cpq_errors::AppResult;

use crate::domain::entities::{FollowUpSource, NewFollowUp};
use crate::domain::value_objects::FollowUpId;

#[async_trait]
pub trait FollowUpRepository: Send + Sync {
    async fn insert(&self, tenant_id: &TenantId, follow_up: &NewFollowUp) -> AppResult<FollowUpId>;

    /// 显式跟进记录与无跟进记录的待办对象的并集
    async fn load_sources(&self, tenant_id: &TenantId) -> AppResult<Vec<FollowUpSource>>;
}
