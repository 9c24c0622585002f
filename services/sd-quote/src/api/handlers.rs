//! HTTP 处理函数

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use cpq_errors::AppError;

use super::AppState;
use super::dto::{
    ChangeAttributeRequest, FollowUpQuery, IdResponse, PricingQuery, QuoteItemsResponse,
    SuccessResponse, ToggleOverrideRequest,
};
use super::tenant::Tenant;
use crate::application::{CreateQuoteFromCart, OrderCreated, QuoteCreated};
use crate::domain::{
    AccountTypeId, AttributeId, DealerFollowUps, LineDraft, NewAccountType, NewPricingTier,
    PriceBand, PricingTierId, QuoteId,
};
use crate::error::QuoteResult;

/// 查询参数错误按校验错误返回
fn query_error(rejection: QueryRejection) -> AppError {
    AppError::validation(rejection.body_text())
}

pub async fn get_pricing(
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Path(attribute_id): Path<AttributeId>,
    query: Result<Query<PricingQuery>, QueryRejection>,
) -> QuoteResult<Json<PriceBand>> {
    let Query(query) = query.map_err(query_error)?;
    let band = state
        .pricing_resolver
        .resolve(&tenant_id, attribute_id, query.dealer_id)
        .await?;
    Ok(Json(band))
}

pub async fn create_pricing(
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Json(tier): Json<NewPricingTier>,
) -> QuoteResult<(StatusCode, Json<IdResponse<PricingTierId>>)> {
    let id = state.pricing_admin.create_tier(&tenant_id, tier).await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

pub async fn create_account_type(
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Json(account_type): Json<NewAccountType>,
) -> QuoteResult<(StatusCode, Json<IdResponse<AccountTypeId>>)> {
    let id = state
        .pricing_admin
        .create_account_type(&tenant_id, account_type)
        .await?;
    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

pub async fn get_quote_items(
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Path(quote_id): Path<QuoteId>,
) -> QuoteResult<Json<QuoteItemsResponse>> {
    let view = state.quote_items.get_items(&tenant_id, quote_id).await?;
    Ok(Json(view.into()))
}

pub async fn save_quote_items(
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Path(quote_id): Path<QuoteId>,
    Json(lines): Json<Vec<LineDraft>>,
) -> QuoteResult<Json<SuccessResponse>> {
    state.quote_items.save(&tenant_id, quote_id, lines).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn convert_quote(
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Path(quote_id): Path<QuoteId>,
) -> QuoteResult<(StatusCode, Json<OrderCreated>)> {
    let order_id = state.converter.convert(&tenant_id, quote_id).await?;
    Ok((StatusCode::CREATED, Json(OrderCreated { order_id })))
}

pub async fn create_quote_from_cart(
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Json(cmd): Json<CreateQuoteFromCart>,
) -> QuoteResult<(StatusCode, Json<QuoteCreated>)> {
    let created = state.quote_creator.create_from_cart(&tenant_id, cmd).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn dealer_follow_ups(
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    query: Result<Query<FollowUpQuery>, QueryRejection>,
) -> QuoteResult<Json<Vec<DealerFollowUps>>> {
    let Query(query) = query.map_err(query_error)?;
    let today = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let dealers = state.follow_ups.aggregate(&tenant_id, today).await?;
    Ok(Json(dealers))
}

pub async fn toggle_override(
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Json(req): Json<ToggleOverrideRequest>,
) -> QuoteResult<Json<LineDraft>> {
    let line = state
        .override_validator
        .toggle_override(&tenant_id, req.dealer_id, req.line, req.enable)
        .await?;
    Ok(Json(line))
}

pub async fn change_attribute(
    State(state): State<AppState>,
    Tenant(tenant_id): Tenant,
    Json(req): Json<ChangeAttributeRequest>,
) -> QuoteResult<Json<LineDraft>> {
    let line = state
        .override_validator
        .change_attribute(&tenant_id, req.dealer_id, req.line, req.attribute_id)
        .await?;
    Ok(Json(line))
}
