//! 产品规格与阶梯价

use cpq_errors::{AppError, AppResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::entities::AccountType;
use crate::domain::value_objects::{AttributeId, PricingTierId, ProductId, apply_margin};

/// 产品规格（变体）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub id: AttributeId,
    pub product_id: ProductId,
    pub name: String,
}

/// 阶梯价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTier {
    pub id: PricingTierId,
    pub attribute_id: AttributeId,
    pub min_quantity: i32,
    pub cost_price: Decimal,
    pub price: Decimal,
}

/// 选择生效的阶梯价
///
/// 取 `min_quantity` 最大的一档，与实际下单数量无关。
pub fn select_active_tier(tiers: &[PricingTier]) -> Option<&PricingTier> {
    tiers.iter().max_by_key(|t| t.min_quantity)
}

/// 新建阶梯价
#[derive(Debug, Clone, Deserialize)]
pub struct NewPricingTier {
    pub attribute_id: AttributeId,
    pub min_quantity: i32,
    pub cost_price: Decimal,
    pub price: Decimal,
}

impl NewPricingTier {
    pub fn validate(&self) -> AppResult<()> {
        if self.min_quantity < 1 {
            return Err(AppError::validation("min_quantity must be at least 1"));
        }
        if self.cost_price < Decimal::ZERO || self.price < Decimal::ZERO {
            return Err(AppError::validation("Prices must not be negative"));
        }
        Ok(())
    }
}

/// 利润率价格区间
///
/// `[min_allowed_price, max_allowed_price]` 由成本价和客户类型利润率得出，两端均包含。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBand {
    pub cost_price: Decimal,
    pub price: Decimal,
    pub min_margin_percent: Decimal,
    pub max_margin_percent: Decimal,
    pub min_allowed_price: Decimal,
    pub max_allowed_price: Decimal,
}

impl PriceBand {
    pub fn compute(tier: &PricingTier, account_type: &AccountType) -> Self {
        Self {
            cost_price: tier.cost_price,
            price: tier.price,
            min_margin_percent: account_type.min_margin_percent,
            max_margin_percent: account_type.max_margin_percent,
            min_allowed_price: apply_margin(tier.cost_price, account_type.min_margin_percent),
            max_allowed_price: apply_margin(tier.cost_price, account_type.max_margin_percent),
        }
    }

    pub fn contains(&self, price: Decimal) -> bool {
        self.min_allowed_price <= price && price <= self.max_allowed_price
    }
}
