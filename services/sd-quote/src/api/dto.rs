//! 请求与响应结构

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::QuoteItemsView;
use crate::domain::{AttributeId, DealerId, LineDraft, ProductId, QuoteItem, QuoteItemId};

#[derive(Debug, Deserialize)]
pub struct PricingQuery {
    pub dealer_id: DealerId,
}

#[derive(Debug, Default, Deserialize)]
pub struct FollowUpQuery {
    /// 默认为服务器当天
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct IdResponse<T> {
    pub id: T,
}

#[derive(Debug, Serialize)]
pub struct QuoteItemDto {
    pub quote_item_id: QuoteItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_attribute_id: AttributeId,
    pub attribute_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub is_selected: bool,
    pub is_override: bool,
}

impl From<QuoteItem> for QuoteItemDto {
    fn from(item: QuoteItem) -> Self {
        Self {
            total_price: item.total_price(),
            quote_item_id: item.id,
            product_id: item.product_id,
            product_name: item.product_name,
            product_attribute_id: item.attribute_id,
            attribute_name: item.attribute_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            is_selected: item.is_selected,
            is_override: item.is_override,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuoteItemsResponse {
    pub items: Vec<QuoteItemDto>,
    pub total_sum: Decimal,
    pub note: String,
}

impl From<QuoteItemsView> for QuoteItemsResponse {
    fn from(view: QuoteItemsView) -> Self {
        Self {
            items: view.items.into_iter().map(QuoteItemDto::from).collect(),
            total_sum: view.total_sum,
            note: view.note,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ToggleOverrideRequest {
    pub dealer_id: DealerId,
    pub line: LineDraft,
    pub enable: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangeAttributeRequest {
    pub dealer_id: DealerId,
    pub line: LineDraft,
    #[serde(rename = "product_attribute_id")]
    pub attribute_id: AttributeId,
}
