//! 订单

use cpq_common::UserId;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::value_objects::{AttributeId, DealerId, OrderId, ProductId, QuoteId};

/// 报价转订单后的初始状态
pub const ORDER_STATUS_FOR_DISPATCH: &str = "For Dispatch";

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub quote_id: Option<QuoteId>,
    pub dealer_id: DealerId,
    pub user_id: UserId,
    pub total_price: Decimal,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub attribute_id: AttributeId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub serial_number: Option<String>,
}

/// 已发货的（产品，规格）组合
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchedLine {
    pub product_id: ProductId,
    pub attribute_id: AttributeId,
    pub product_name: String,
    pub order_id: OrderId,
}
