//! 命令与结果

use cpq_common::UserId;
use cpq_errors::{AppError, AppResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{
    DealerId, NewDealer, NewQuoteItem, OrderId, QuoteId, QuoteItem, round_currency,
};

/// 请求中的经销商
///
/// 有 `dealer_id` 时必须已存在；否则按手机号查找，不存在则在首单时创建。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DealerRef {
    #[serde(default)]
    pub dealer_id: Option<DealerId>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub account_manager_id: Option<UserId>,
}

impl DealerRef {
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    pub fn to_new_dealer(&self, account_manager_id: UserId) -> AppResult<NewDealer> {
        let phone = self
            .phone()
            .ok_or_else(|| AppError::validation("Dealer phone is required"))?;
        let dealer = NewDealer {
            full_name: self.full_name.clone().unwrap_or_default().trim().to_string(),
            phone: phone.to_string(),
            account_type: self.account_type.clone().unwrap_or_default().trim().to_string(),
            account_manager_id: Some(account_manager_id),
        };
        dealer.validate()?;
        Ok(dealer)
    }
}

/// 从购物车创建报价单
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuoteFromCart {
    pub dealer: DealerRef,
    pub user_id: UserId,
    /// 客户端计算的合计，仅用于核对
    #[serde(default)]
    pub total_price: Option<Decimal>,
    #[serde(rename = "cartItems")]
    pub cart_items: Vec<NewQuoteItem>,
    #[serde(default)]
    pub note: Option<String>,
}

impl CreateQuoteFromCart {
    pub fn validate(&self) -> AppResult<()> {
        if self.user_id.value() <= 0 {
            return Err(AppError::validation("user_id is required"));
        }
        if self.dealer.dealer_id.is_none() && self.dealer.phone().is_none() {
            return Err(AppError::validation("Dealer id or phone is required"));
        }
        if self.cart_items.is_empty() {
            return Err(AppError::validation("Cart is empty"));
        }
        self.cart_items.iter().try_for_each(NewQuoteItem::validate)
    }

    pub fn cart_total(&self) -> Decimal {
        round_currency(self.cart_items.iter().map(NewQuoteItem::total_price).sum())
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuoteCreated {
    pub quote_id: QuoteId,
    pub dealer_id: DealerId,
    pub assigned_kam_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
}

/// 报价行读取结果
#[derive(Debug, Clone)]
pub struct QuoteItemsView {
    pub items: Vec<QuoteItem>,
    /// 选中行合计
    pub total_sum: Decimal,
    pub note: String,
}
