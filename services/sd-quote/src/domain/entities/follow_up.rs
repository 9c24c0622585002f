//! 跟进记录

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use cpq_common::UserId;
use cpq_errors::AppError;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{DealerId, FollowUpId};

/// 跟进对象类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Quote,
    Order,
    Sr,
    /// 物流回单，由单独的流程处理
    Lr,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Quote => "quote",
            EntityType::Order => "order",
            EntityType::Sr => "sr",
            EntityType::Lr => "lr",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quote" => Ok(EntityType::Quote),
            "order" => Ok(EntityType::Order),
            "sr" => Ok(EntityType::Sr),
            "lr" => Ok(EntityType::Lr),
            other => Err(AppError::validation(format!("Unknown entity type: {}", other))),
        }
    }
}

pub const FOLLOW_UP_STATUS_PENDING: &str = "Pending";

/// 终态：跟进记录或业务对象处于这些状态时不再计算逾期
pub const TERMINAL_STATUSES: [&str; 4] = ["Completed", "Finalized", "Closed", "Cancelled"];

pub fn is_terminal_status(status: &str) -> bool {
    TERMINAL_STATUSES.contains(&status)
}

#[derive(Debug, Clone)]
pub struct NewFollowUp {
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub assigned_to: UserId,
    pub created_by: UserId,
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// 跟进来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpOrigin {
    /// follow_ups 表中的记录
    Explicit,
    /// 处于待办状态但尚无跟进记录的业务对象
    Implicit,
}

/// 聚合前的一行跟进数据
#[derive(Debug, Clone)]
pub struct FollowUpSource {
    pub dealer_id: DealerId,
    pub dealer_name: String,
    pub is_important: bool,
    pub follow_up_id: Option<FollowUpId>,
    pub entity_type: EntityType,
    pub entity_id: i64,
    /// 空的 due_date 已回退为业务对象的创建日期
    pub due_date: NaiveDate,
    pub status: String,
    pub entity_status: String,
    pub origin: FollowUpOrigin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowUpEntry {
    pub follow_up_id: Option<FollowUpId>,
    pub entity_id: i64,
    pub due_date: NaiveDate,
    pub status: String,
    pub entity_status: String,
    pub origin: FollowUpOrigin,
    pub days_pending: i64,
    pub is_overdue: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FollowUpGroups {
    pub quote: Vec<FollowUpEntry>,
    pub order: Vec<FollowUpEntry>,
    pub sr: Vec<FollowUpEntry>,
}

/// 单个经销商的跟进视图
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealerFollowUps {
    pub dealer_id: DealerId,
    pub dealer_name: String,
    pub is_important: bool,
    pub follow_ups: FollowUpGroups,
    pub max_days_pending: i64,
}
