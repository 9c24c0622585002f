//! 报价单与报价行

use std::fmt;

use chrono::{DateTime, Utc};
use cpq_common::{TenantId, UserId};
use cpq_errors::{AppError, AppResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{AttributeId, DealerId, ProductId, QuoteId, QuoteItemId};

/// 报价单状态
///
/// 状态流转由外部驱动，这里只区分是否仍然打开。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteStatus {
    Draft,
    Sent,
    Finalized,
    Cancelled,
    Other(String),
}

impl QuoteStatus {
    pub fn as_str(&self) -> &str {
        match self {
            QuoteStatus::Draft => "Draft",
            QuoteStatus::Sent => "Sent",
            QuoteStatus::Finalized => "Finalized",
            QuoteStatus::Cancelled => "Cancelled",
            QuoteStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "Draft" => QuoteStatus::Draft,
            "Sent" => QuoteStatus::Sent,
            "Finalized" => QuoteStatus::Finalized,
            "Cancelled" => QuoteStatus::Cancelled,
            other => QuoteStatus::Other(other.to_string()),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, QuoteStatus::Finalized | QuoteStatus::Cancelled)
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 报价单
#[derive(Debug, Clone)]
pub struct Quote {
    pub id: QuoteId,
    pub tenant_id: TenantId,
    pub dealer_id: DealerId,
    pub user_id: UserId,
    pub assigned_kam_id: Option<UserId>,
    /// 创建时写入，权威值始终由报价行重新汇总
    pub total_price: Decimal,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuote {
    pub dealer_id: DealerId,
    pub user_id: UserId,
    pub assigned_kam_id: UserId,
    pub total_price: Decimal,
    pub status: QuoteStatus,
}

/// 报价行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteItem {
    pub id: QuoteItemId,
    pub quote_id: QuoteId,
    pub product_id: ProductId,
    pub product_name: String,
    pub attribute_id: AttributeId,
    pub attribute_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub is_selected: bool,
    pub is_override: bool,
}

impl QuoteItem {
    pub fn total_price(&self) -> Decimal {
        line_total(self.unit_price, self.quantity)
    }
}

pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// 选中行的合计（读取时汇总，不落库）
pub fn selected_total<'a>(items: impl IntoIterator<Item = &'a QuoteItem>) -> Decimal {
    items
        .into_iter()
        .filter(|i| i.is_selected)
        .map(QuoteItem::total_price)
        .sum()
}

/// 购物车行，创建报价单时写入
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuoteItem {
    pub product_id: ProductId,
    #[serde(rename = "product_attribute_id")]
    pub attribute_id: AttributeId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl NewQuoteItem {
    pub fn validate(&self) -> AppResult<()> {
        if self.quantity < 1 {
            return Err(AppError::validation(format!(
                "Quantity for attribute {} must be at least 1",
                self.attribute_id
            )));
        }
        if self.unit_price < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Unit price for attribute {} must not be negative",
                self.attribute_id
            )));
        }
        Ok(())
    }

    pub fn total_price(&self) -> Decimal {
        line_total(self.unit_price, self.quantity)
    }
}

/// 报价行的客户端草稿状态
///
/// `unit_price` 在手工改价时即为手工价，缺失视为无效。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineDraft {
    pub quote_item_id: QuoteItemId,
    #[serde(rename = "product_attribute_id")]
    pub attribute_id: AttributeId,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default = "default_selected")]
    pub is_selected: bool,
    #[serde(default)]
    pub is_override: bool,
}

fn default_selected() -> bool {
    true
}

/// 写回数据库的报价行字段
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteItemUpdate {
    pub quote_item_id: QuoteItemId,
    pub attribute_id: AttributeId,
    pub unit_price: Decimal,
    pub is_selected: bool,
    pub is_override: bool,
}
