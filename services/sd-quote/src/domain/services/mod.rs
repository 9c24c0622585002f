//! 领域服务

mod follow_up_aggregation;
mod kam;

pub use follow_up_aggregation::aggregate as aggregate_follow_ups;
pub use kam::{KamClaim, KamDecision, KamState};
