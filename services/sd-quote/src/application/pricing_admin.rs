//! 阶梯价与客户类型维护

use std::sync::Arc;

use cpq_common::TenantId;
use cpq_errors::AppError;
use tracing::info;

use crate::domain::{
    AccountTypeId, NewAccountType, NewPricingTier, PricingTierId, UnitOfWorkFactory,
};
use crate::error::QuoteResult;

pub struct PricingAdmin {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl PricingAdmin {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    /// 新增阶梯价，同一规格同一起订量只能有一档
    pub async fn create_tier(&self, tenant_id: &TenantId, tier: NewPricingTier) -> QuoteResult<PricingTierId> {
        tier.validate()?;

        let uow = self.uow_factory.begin().await?;

        if uow
            .pricing()
            .find_attribute(tenant_id, tier.attribute_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found(format!("Attribute {} not found", tier.attribute_id)).into());
        }

        if uow
            .pricing()
            .tier_exists(tenant_id, tier.attribute_id, tier.min_quantity)
            .await?
        {
            return Err(AppError::conflict(format!(
                "DUPLICATE_PRICING: attribute {} already has a tier at min_quantity {}",
                tier.attribute_id, tier.min_quantity
            ))
            .into());
        }

        let id = uow.pricing().insert_tier(tenant_id, &tier).await?;
        uow.commit().await?;

        info!(pricing_id = %id, attribute_id = %tier.attribute_id, min_quantity = tier.min_quantity, "Pricing tier created");
        Ok(id)
    }

    pub async fn create_account_type(
        &self,
        tenant_id: &TenantId,
        account_type: NewAccountType,
    ) -> QuoteResult<AccountTypeId> {
        account_type.validate()?;

        let uow = self.uow_factory.begin().await?;

        let name = account_type.name.trim();
        if uow.account_types().find_by_name(tenant_id, name).await?.is_some() {
            return Err(AppError::conflict(format!("Account type '{}' already exists", name)).into());
        }

        let account_type = NewAccountType {
            name: name.to_string(),
            ..account_type
        };
        let id = uow.account_types().insert(tenant_id, &account_type).await?;
        uow.commit().await?;

        info!(account_type_id = %id, name = %account_type.name, "Account type created");
        Ok(id)
    }
}
