//! 经销商解析与客户经理（KAM）认领
//!
//! 在报价单创建所在的事务内执行。经销商行在事务内始终持有行锁，
//! 并发的首单请求在锁上排队，只有第一个提交的事务写入 KAM。

use cpq_common::{TenantId, UserId};
use cpq_errors::{AppError, AppResult};
use metrics::counter;
use tracing::{debug, info};

use crate::application::DealerRef;
use crate::domain::{Dealer, DealerId, KamClaim, KamDecision, KamState, UnitOfWork};

/// KAM 的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KamOutcome {
    /// 新建经销商时写入
    Inserted,
    /// 原为空，由本次请求认领
    Claimed,
    /// 已有 KAM，保持不变
    Retained,
}

impl KamOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            KamOutcome::Inserted => "inserted",
            KamOutcome::Claimed => "claimed",
            KamOutcome::Retained => "retained",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KamAssignment {
    pub dealer_id: DealerId,
    pub kam_id: UserId,
    pub outcome: KamOutcome,
}

#[derive(Debug, Default)]
pub struct DealerKamAssigner;

impl DealerKamAssigner {
    pub fn new() -> Self {
        Self
    }

    pub async fn assign_or_retain(
        &self,
        uow: &dyn UnitOfWork,
        tenant_id: &TenantId,
        dealer: &DealerRef,
        creator: UserId,
    ) -> AppResult<KamAssignment> {
        let existing = match dealer.dealer_id {
            Some(id) => Some(
                uow.dealers()
                    .find_for_update(tenant_id, id)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Dealer {} not found", id)))?,
            ),
            None => {
                let phone = dealer
                    .phone()
                    .ok_or_else(|| AppError::validation("Dealer id or phone is required"))?;
                uow.dealers()
                    .find_by_phone_for_update(tenant_id, phone)
                    .await?
            }
        };

        let assignment = match existing {
            Some(row) => self.settle(uow, tenant_id, &row, creator).await?,
            None => self.insert(uow, tenant_id, dealer, creator).await?,
        };

        counter!("cpq_kam_claims_total", "outcome" => assignment.outcome.as_str()).increment(1);
        info!(
            dealer_id = %assignment.dealer_id,
            kam_id = %assignment.kam_id,
            outcome = assignment.outcome.as_str(),
            "KAM resolved"
        );
        Ok(assignment)
    }

    /// Unknown → 插入经销商，KAM = 请求中的提议值或创建人
    async fn insert(
        &self,
        uow: &dyn UnitOfWork,
        tenant_id: &TenantId,
        dealer: &DealerRef,
        creator: UserId,
    ) -> AppResult<KamAssignment> {
        let kam = match KamState::Unknown.decide(dealer.account_manager_id, creator) {
            KamDecision::InsertDealer { kam } => kam,
            other => {
                return Err(AppError::internal(format!(
                    "Unexpected KAM decision for a new dealer: {:?}",
                    other
                )));
            }
        };

        let new_dealer = dealer.to_new_dealer(kam)?;
        if let Some(dealer_id) = uow.dealers().insert_if_absent(tenant_id, &new_dealer).await? {
            return Ok(KamAssignment {
                dealer_id,
                kam_id: kam,
                outcome: KamOutcome::Inserted,
            });
        }

        // 并发请求先插入了同一手机号，等其提交后按已存在处理
        debug!(phone = %new_dealer.phone, "Dealer inserted concurrently, re-reading under lock");
        let row = uow
            .dealers()
            .find_by_phone_for_update(tenant_id, &new_dealer.phone)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Dealer with phone {} vanished after insert conflict",
                    new_dealer.phone
                ))
            })?;
        self.settle(uow, tenant_id, &row, creator).await
    }

    /// 已加锁的经销商行：Unassigned → 认领，LockedIn → 保持
    async fn settle(
        &self,
        uow: &dyn UnitOfWork,
        tenant_id: &TenantId,
        dealer: &Dealer,
        creator: UserId,
    ) -> AppResult<KamAssignment> {
        match dealer.kam_state().decide(None, creator) {
            KamDecision::Retain { kam } => Ok(KamAssignment {
                dealer_id: dealer.id,
                kam_id: kam,
                outcome: KamOutcome::Retained,
            }),
            KamDecision::Claim { candidate } => {
                let claim = uow
                    .dealers()
                    .claim_account_manager(tenant_id, dealer.id, candidate)
                    .await?;
                Ok(KamAssignment {
                    dealer_id: dealer.id,
                    kam_id: claim.kam(),
                    outcome: match claim {
                        KamClaim::Claimed(_) => KamOutcome::Claimed,
                        KamClaim::AlreadyHeld(_) => KamOutcome::Retained,
                    },
                })
            }
            KamDecision::InsertDealer { .. } => Err(AppError::internal(format!(
                "Dealer {} exists but resolved to an unknown KAM state",
                dealer.id
            ))),
        }
    }
}
