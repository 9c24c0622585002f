//! 实体模块

mod account_type;
mod dealer;
mod follow_up;
mod order;
mod pricing;
mod quote;

pub use account_type::{AccountCategory, AccountType, NewAccountType, validate_margins};
pub use dealer::{Dealer, NewDealer};
pub use follow_up::{
    DealerFollowUps, EntityType, FOLLOW_UP_STATUS_PENDING, FollowUpEntry, FollowUpGroups,
    FollowUpOrigin, FollowUpSource, NewFollowUp, TERMINAL_STATUSES, is_terminal_status,
};
pub use order::{DispatchedLine, NewOrder, NewOrderLine, ORDER_STATUS_FOR_DISPATCH};
pub use pricing::{NewPricingTier, PriceBand, PricingTier, ProductAttribute, select_active_tier};
pub use quote::{
    LineDraft, NewQuote, NewQuoteItem, Quote, QuoteItem, QuoteItemUpdate, QuoteStatus,
    line_total, selected_total,
};
