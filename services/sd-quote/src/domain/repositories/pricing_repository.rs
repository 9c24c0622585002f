//! 产品规格与阶梯价仓储接口

use async_trait::async_trait;
use cpq_common::TenantId;
use cpq_errors::AppResult;

use crate::domain::entities::{NewPricingTier, PricingTier, ProductAttribute};
use crate::domain::value_objects::{AttributeId, PricingTierId};

#[async_trait]
pub trait PricingRepository: Send + Sync {
    async fn find_attribute(
        &self,
        tenant_id: &TenantId,
        attribute_id: AttributeId,
    ) -> AppResult<Option<ProductAttribute>>;

    async fn find_tiers(&self, tenant_id: &TenantId, attribute_id: AttributeId) -> AppResult<Vec<PricingTier>>;

    async fn tier_exists(
        &self,
        tenant_id: &TenantId,
        attribute_id: AttributeId,
        min_quantity: i32,
    ) -> AppResult<bool>;

    async fn insert_tier(&self, tenant_id: &TenantId, tier: &NewPricingTier) -> AppResult<PricingTierId>;
}
