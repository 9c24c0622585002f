//! 价格解析
//!
//! 经销商 → 客户类型（按名称）→ 生效阶梯价 → 利润率价格区间

use std::sync::Arc;

use async_trait::async_trait;
use cpq_common::TenantId;
use cpq_errors::{AppError, AppResult};
use tracing::debug;

use crate::domain::{AttributeId, DealerId, PriceBand, UnitOfWorkFactory, select_active_tier};

/// 价格区间来源
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceBandLookup: Send + Sync {
    async fn lookup(
        &self,
        tenant_id: &TenantId,
        attribute_id: AttributeId,
        dealer_id: DealerId,
    ) -> AppResult<PriceBand>;
}

pub struct PricingResolver {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl PricingResolver {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    /// 缺少经销商、客户类型或阶梯价时返回 `NotFound`，不提供兜底价格
    pub async fn resolve(
        &self,
        tenant_id: &TenantId,
        attribute_id: AttributeId,
        dealer_id: DealerId,
    ) -> AppResult<PriceBand> {
        let uow = self.uow_factory.begin().await?;

        let dealer = uow
            .dealers()
            .find_by_id(tenant_id, dealer_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Dealer {} not found", dealer_id)))?;

        let account_type = uow
            .account_types()
            .find_by_name(tenant_id, &dealer.account_type)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Account type '{}' of dealer {} not found",
                    dealer.account_type, dealer_id
                ))
            })?;

        let tiers = uow.pricing().find_tiers(tenant_id, attribute_id).await?;
        let tier = select_active_tier(&tiers).ok_or_else(|| {
            AppError::not_found(format!("No pricing found for attribute {}", attribute_id))
        })?;

        let band = PriceBand::compute(tier, &account_type);
        debug!(
            %attribute_id,
            %dealer_id,
            min_quantity = tier.min_quantity,
            min_allowed = %band.min_allowed_price,
            max_allowed = %band.max_allowed_price,
            "Price band resolved"
        );

        uow.commit().await?;
        Ok(band)
    }
}

#[async_trait]
impl PriceBandLookup for PricingResolver {
    async fn lookup(
        &self,
        tenant_id: &TenantId,
        attribute_id: AttributeId,
        dealer_id: DealerId,
    ) -> AppResult<PriceBand> {
        self.resolve(tenant_id, attribute_id, dealer_id).await
    }
}
