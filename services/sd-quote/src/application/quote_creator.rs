//! 从购物车创建报价单
//!
//! 经销商、KAM、报价单、报价行、备注和跟进记录在同一事务中写入，任一步失败全部回滚。

use std::sync::Arc;

use cpq_common::TenantId;
use metrics::counter;
use tracing::{info, warn};

use crate::application::{CreateQuoteFromCart, DealerKamAssigner, QuoteCreated};
use crate::domain::{
    EntityType, FOLLOW_UP_STATUS_PENDING, NewFollowUp, NewQuote, QuoteStatus, UnitOfWorkFactory,
};
use crate::error::QuoteResult;

pub struct QuoteCreator {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    kam_assigner: DealerKamAssigner,
}

impl QuoteCreator {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self {
            uow_factory,
            kam_assigner: DealerKamAssigner::new(),
        }
    }

    pub async fn create_from_cart(
        &self,
        tenant_id: &TenantId,
        cmd: CreateQuoteFromCart,
    ) -> QuoteResult<QuoteCreated> {
        cmd.validate()?;

        let total_price = cmd.cart_total();
        if let Some(client_total) = cmd.total_price {
            if client_total != total_price {
                warn!(
                    client_total = %client_total,
                    cart_total = %total_price,
                    "Client total differs from cart lines, using cart total"
                );
            }
        }

        let uow = self.uow_factory.begin().await?;

        let kam = self
            .kam_assigner
            .assign_or_retain(uow.as_ref(), tenant_id, &cmd.dealer, cmd.user_id)
            .await?;

        let quote_id = uow
            .quotes()
            .insert(
                tenant_id,
                &NewQuote {
                    dealer_id: kam.dealer_id,
                    user_id: cmd.user_id,
                    assigned_kam_id: kam.kam_id,
                    total_price,
                    status: QuoteStatus::Draft,
                },
            )
            .await?;

        uow.quote_items()
            .insert_batch(tenant_id, quote_id, &cmd.cart_items)
            .await?;

        if let Some(note) = cmd.note() {
            uow.notes()
                .insert(tenant_id, quote_id, note, cmd.user_id)
                .await?;
        }

        uow.follow_ups()
            .insert(
                tenant_id,
                &NewFollowUp {
                    entity_type: EntityType::Quote,
                    entity_id: quote_id.value(),
                    assigned_to: cmd.user_id,
                    created_by: cmd.user_id,
                    status: FOLLOW_UP_STATUS_PENDING.to_string(),
                    due_date: None,
                    notes: None,
                },
            )
            .await?;

        uow.commit().await?;

        counter!("cpq_quotes_created_total").increment(1);
        info!(
            tenant_id = %tenant_id,
            %quote_id,
            dealer_id = %kam.dealer_id,
            assigned_kam_id = %kam.kam_id,
            items = cmd.cart_items.len(),
            "Quote created from cart"
        );

        Ok(QuoteCreated {
            quote_id,
            dealer_id: kam.dealer_id,
            assigned_kam_id: kam.kam_id,
        })
    }
}
