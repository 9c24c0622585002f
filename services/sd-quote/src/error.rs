//! 报价引擎错误类型

use cpq_errors::AppError;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{DispatchedLine, QuoteId, QuoteItemId};

/// 手工价不在允许区间内的报价行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideViolation {
    pub quote_item_id: QuoteItemId,
    /// 缺失的手工价为 `None`
    pub manual_price: Option<Decimal>,
    pub min_allowed_price: Decimal,
    pub max_allowed_price: Decimal,
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Manual price outside the allowed range for items: {}", join_item_ids(.0.iter().map(|v| v.quote_item_id)))]
    InvalidOverrides(Vec<OverrideViolation>),

    #[error("Quote item {quote_item_id}: {reason}")]
    InvalidState {
        quote_item_id: QuoteItemId,
        reason: String,
    },

    #[error("No items selected for quote {quote_id}")]
    NoItemsSelected { quote_id: QuoteId },

    #[error("Order already created for some items: {}", describe_dispatched(.0))]
    AlreadyDispatched(Vec<DispatchedLine>),

    #[error("Items not found on quote: {}", join_item_ids(.0.iter().copied()))]
    ItemsNotSaved(Vec<QuoteItemId>),

    #[error(transparent)]
    App(#[from] AppError),
}

impl QuoteError {
    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidOverrides(_) => 400,
            Self::InvalidState { .. } => 412,
            Self::NoItemsSelected { .. } => 400,
            Self::AlreadyDispatched(_) => 400,
            Self::ItemsNotSaved(_) => 400,
            Self::App(e) => e.status_code(),
        }
    }

    /// 用于指标标签的稳定原因
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidOverrides(_) => "invalid_override",
            Self::InvalidState { .. } => "invalid_state",
            Self::NoItemsSelected { .. } => "no_items_selected",
            Self::AlreadyDispatched(_) => "already_dispatched",
            Self::ItemsNotSaved(_) => "items_not_saved",
            Self::App(AppError::NotFound(_)) => "not_found",
            Self::App(AppError::Validation(_)) => "validation",
            Self::App(AppError::Conflict(_)) => "conflict",
            Self::App(AppError::FailedPrecondition(_)) => "failed_precondition",
            Self::App(_) => "transaction_failure",
        }
    }
}

fn join_item_ids(ids: impl Iterator<Item = QuoteItemId>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}

/// `<product>@Order <id>; …`
fn describe_dispatched(lines: &[DispatchedLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{}@Order {}", l.product_name, l.order_id))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type QuoteResult<T> = Result<T, QuoteError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttributeId, OrderId, ProductId};

    #[test]
    fn test_already_dispatched_message() {
        let err = QuoteError::AlreadyDispatched(vec![
            DispatchedLine {
                product_id: ProductId(1),
                attribute_id: AttributeId(11),
                product_name: "Inverter".to_string(),
                order_id: OrderId(7),
            },
            DispatchedLine {
                product_id: ProductId(2),
                attribute_id: AttributeId(22),
                product_name: "Battery".to_string(),
                order_id: OrderId(7),
            },
        ]);

        assert_eq!(
            err.to_string(),
            "Order already created for some items: Inverter@Order 7; Battery@Order 7"
        );
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_app_error_passthrough() {
        let err: QuoteError = AppError::not_found("Quote 42 not found").into();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.reason(), "not_found");
        assert_eq!(err.to_string(), "Not found: Quote 42 not found");
    }
}
