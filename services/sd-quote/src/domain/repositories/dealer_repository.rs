//! 经销商仓储接口

use async_trait::async_trait;
use cpq_common::{TenantId, UserId};
use cpq_errors::AppResult;

use crate::domain::entities::{Dealer, NewDealer};
use crate::domain::services::KamClaim;
use crate::domain::value_objects::DealerId;

#[async_trait]
pub trait DealerRepository: Send + Sync {
    /// 不加锁读取
    async fn find_by_id(&self, tenant_id: &TenantId, id: DealerId) -> AppResult<Option<Dealer>>;

    /// 读取并持有行锁直到事务结束
    async fn find_for_update(&self, tenant_id: &TenantId, id: DealerId) -> AppResult<Option<Dealer>>;

    async fn find_by_phone_for_update(
        &self,
        tenant_id: &TenantId,
        phone: &str,
    ) -> AppResult<Option<Dealer>>;

    /// 按 `(tenant, phone)` 插入，已存在时返回 `None`
    async fn insert_if_absent(&self, tenant_id: &TenantId, dealer: &NewDealer) -> AppResult<Option<DealerId>>;

    /// KAM 为空时写入候选人，否则返回当前持有者
    async fn claim_account_manager(
        &self,
        tenant_id: &TenantId,
        id: DealerId,
        candidate: UserId,
    ) -> AppResult<KamClaim>;
}
