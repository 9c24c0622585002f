//! 值对象模块

mod ids;
mod money;

pub use ids::{
    AccountTypeId, AttributeId, DealerId, FollowUpId, OrderId, PricingTierId, ProductId,
    QuoteId, QuoteItemId,
};
pub use money::{CURRENCY_SCALE, apply_margin, round_currency};
