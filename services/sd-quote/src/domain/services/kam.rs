//! 客户经理（KAM）认领状态机
//!
//! ```text
//! Unknown ──首单──▶ Assigned(KAM = 提议值 ?? 创建人)
//! Unassigned ──行锁 + 条件写──▶ LockedIn(创建人)
//! LockedIn ──────────────────▶ LockedIn（不变）
//! ```

use cpq_common::UserId;

/// 经销商当前的 KAM 状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KamState {
    /// 经销商行不存在
    Unknown,
    /// 行存在但 KAM 为空
    Unassigned,
    LockedIn(UserId),
}

/// 状态机给出的下一步动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KamDecision {
    InsertDealer { kam: UserId },
    Claim { candidate: UserId },
    Retain { kam: UserId },
}

impl KamState {
    pub fn decide(&self, proposed: Option<UserId>, creator: UserId) -> KamDecision {
        match self {
            KamState::Unknown => KamDecision::InsertDealer {
                kam: proposed.unwrap_or(creator),
            },
            KamState::Unassigned => KamDecision::Claim { candidate: creator },
            KamState::LockedIn(kam) => KamDecision::Retain { kam: *kam },
        }
    }
}

/// 条件写的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KamClaim {
    Claimed(UserId),
    AlreadyHeld(UserId),
}

impl KamClaim {
    pub fn kam(&self) -> UserId {
        match self {
            KamClaim::Claimed(kam) | KamClaim::AlreadyHeld(kam) => *kam,
        }
    }
}
