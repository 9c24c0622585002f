//! 客户类型实体
//!
//! 客户类型决定经销商可用的利润率区间

use std::fmt;
use std::str::FromStr;

use cpq_common::TenantId;
use cpq_errors::{AppError, AppResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::AccountTypeId;

/// 客户类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountCategory {
    Dealer,
    Individual,
}

impl AccountCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountCategory::Dealer => "Dealer",
            AccountCategory::Individual => "Individual",
        }
    }
}

impl fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Dealer" => Ok(AccountCategory::Dealer),
            "Individual" => Ok(AccountCategory::Individual),
            other => Err(AppError::validation(format!(
                "Unknown account category: {}",
                other
            ))),
        }
    }
}

/// 客户类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountType {
    pub id: AccountTypeId,
    pub tenant_id: TenantId,
    pub name: String,
    pub category: AccountCategory,
    pub min_margin_percent: Decimal,
    pub max_margin_percent: Decimal,
}

/// 新建客户类型
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccountType {
    pub name: String,
    pub category: AccountCategory,
    pub min_margin_percent: Decimal,
    pub max_margin_percent: Decimal,
}

impl NewAccountType {
    /// 校验名称与利润率区间 `0 ≤ min ≤ max ≤ 100`
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Account type name is required"));
        }
        validate_margins(self.min_margin_percent, self.max_margin_percent)
    }
}

pub fn validate_margins(min: Decimal, max: Decimal) -> AppResult<()> {
    if min < Decimal::ZERO || max > Decimal::ONE_HUNDRED {
        return Err(AppError::validation(format!(
            "Margins must be between 0 and 100, got {}..{}",
            min, max
        )));
    }
    if min > max {
        return Err(AppError::validation(format!(
            "Minimum margin {} exceeds maximum margin {}",
            min, max
        )));
    }
    Ok(())
}
