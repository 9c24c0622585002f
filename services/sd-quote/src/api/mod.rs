//! HTTP 接口层

mod dto;
mod error;
mod handlers;
mod tenant;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::application::{
    FollowUpAggregator, OverrideValidator, PriceBandLookup, PricingAdmin, PricingResolver,
    QuoteCreator, QuoteItemStore, QuoteToOrderConverter,
};
use crate::domain::UnitOfWorkFactory;

pub use tenant::{TENANT_HEADER, Tenant};

/// 处理函数共享的应用服务
#[derive(Clone)]
pub struct AppState {
    pub pricing_resolver: Arc<PricingResolver>,
    pub override_validator: Arc<OverrideValidator>,
    pub quote_items: Arc<QuoteItemStore>,
    pub quote_creator: Arc<QuoteCreator>,
    pub converter: Arc<QuoteToOrderConverter>,
    pub follow_ups: Arc<FollowUpAggregator>,
    pub pricing_admin: Arc<PricingAdmin>,
}

impl AppState {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        let pricing_resolver = Arc::new(PricingResolver::new(uow_factory.clone()));
        let lookup: Arc<dyn PriceBandLookup> = pricing_resolver.clone();
        let override_validator = Arc::new(OverrideValidator::new(lookup.clone()));

        Self {
            quote_items: Arc::new(QuoteItemStore::new(
                uow_factory.clone(),
                override_validator.clone(),
                lookup,
            )),
            quote_creator: Arc::new(QuoteCreator::new(uow_factory.clone())),
            converter: Arc::new(QuoteToOrderConverter::new(uow_factory.clone())),
            follow_ups: Arc::new(FollowUpAggregator::new(uow_factory.clone())),
            pricing_admin: Arc::new(PricingAdmin::new(uow_factory)),
            pricing_resolver,
            override_validator,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/pricing", post(handlers::create_pricing))
        .route("/api/pricing/{attribute_id}", get(handlers::get_pricing))
        .route("/api/account-types", post(handlers::create_account_type))
        .route("/api/quotationitems/{quote_id}", get(handlers::get_quote_items))
        .route(
            "/api/save-quotation-items/{quote_id}",
            post(handlers::save_quote_items),
        )
        .route("/api/quotestoorder/{quote_id}", post(handlers::convert_quote))
        .route(
            "/api/dealer-quotation-from-cart",
            post(handlers::create_quote_from_cart),
        )
        .route("/api/dealer-followups", get(handlers::dealer_follow_ups))
        .route("/api/quote-lines/toggle-override", post(handlers::toggle_override))
        .route("/api/quote-lines/change-attribute", post(handlers::change_attribute))
        .with_state(state)
}
