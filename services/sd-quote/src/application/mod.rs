//! 应用层

mod commands;
mod dealer_kam_assigner;
mod follow_up_aggregator;
mod override_validator;
mod pricing_admin;
mod pricing_resolver;
mod quote_creator;
mod quote_item_store;
mod quote_to_order_converter;

pub use commands::*;
pub use dealer_kam_assigner::{DealerKamAssigner, KamAssignment, KamOutcome};
pub use follow_up_aggregator::FollowUpAggregator;
pub use override_validator::OverrideValidator;
pub use pricing_admin::PricingAdmin;
#[cfg(test)]
pub use pricing_resolver::MockPriceBandLookup;
pub use pricing_resolver::{PriceBandLookup, PricingResolver};
pub use quote_creator::QuoteCreator;
pub use quote_item_store::QuoteItemStore;
pub use quote_to_order_converter::QuoteToOrderConverter;
