//! 经销商跟进看板

use std::sync::Arc;

use chrono::NaiveDate;
use cpq_common::TenantId;
use tracing::debug;

use crate::domain::{DealerFollowUps, UnitOfWorkFactory, aggregate_follow_ups};
use crate::error::QuoteResult;

pub struct FollowUpAggregator {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl FollowUpAggregator {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    pub async fn aggregate(
        &self,
        tenant_id: &TenantId,
        today: NaiveDate,
    ) -> QuoteResult<Vec<DealerFollowUps>> {
        let uow = self.uow_factory.begin().await?;
        let sources = uow.follow_ups().load_sources(tenant_id).await?;
        uow.commit().await?;

        debug!(rows = sources.len(), %today, "Aggregating dealer follow-ups");
        Ok(aggregate_follow_ups(sources, today))
    }
}
