//! 经销商实体

use cpq_common::{TenantId, UserId};
use cpq_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::domain::services::KamState;
use crate::domain::value_objects::DealerId;

/// 经销商
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dealer {
    pub id: DealerId,
    pub tenant_id: TenantId,
    pub full_name: String,
    pub phone: String,
    /// 关联 `AccountType.name`
    pub account_type: String,
    /// 客户经理（KAM），首单时隐式认领
    pub account_manager_id: Option<UserId>,
    pub is_important: bool,
}

impl Dealer {
    pub fn kam_state(&self) -> KamState {
        match self.account_manager_id {
            Some(kam) => KamState::LockedIn(kam),
            None => KamState::Unassigned,
        }
    }
}

/// 首单时创建的经销商
#[derive(Debug, Clone)]
pub struct NewDealer {
    pub full_name: String,
    pub phone: String,
    pub account_type: String,
    pub account_manager_id: Option<UserId>,
}

impl NewDealer {
    pub fn validate(&self) -> AppResult<()> {
        if self.phone.trim().is_empty() {
            return Err(AppError::validation("Dealer phone is required"));
        }
        if self.full_name.trim().is_empty() {
            return Err(AppError::validation("Dealer name is required"));
        }
        if self.account_type.trim().is_empty() {
            return Err(AppError::validation("Dealer account type is required"));
        }
        Ok(())
    }
}
