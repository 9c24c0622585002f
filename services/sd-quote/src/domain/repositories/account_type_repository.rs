//! 客户类型仓储接口

use async_trait::async_trait;
use cpq_common::TenantId;
use cpq_errors::AppResult;

use crate::domain::entities::{AccountType, NewAccountType};
use crate::domain::value_objects::AccountTypeId;

#[async_trait]
pub trait AccountTypeRepository: Send + Sync {
    async fn find_by_name(&self, tenant_id: &TenantId, name: &str) -> AppResult<Option<AccountType>>;

    async fn insert(&self, tenant_id: &TenantId, account_type: &NewAccountType) -> AppResult<AccountTypeId>;
}
