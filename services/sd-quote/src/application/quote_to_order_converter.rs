//! 报价转订单
//!
//! 锁定报价单 → 读取选中行 → 检查已发货组合 → 插入订单和订单行，全部在一个事务内。
//! 报价单行锁使同一报价单的并发转换串行执行，订单行上的部分唯一索引兜底。

use std::collections::BTreeSet;
use std::sync::Arc;

use cpq_common::TenantId;
use cpq_errors::AppError;
use metrics::counter;
use tracing::{error, info, warn};

use crate::domain::{
    NewOrder, NewOrderLine, ORDER_STATUS_FOR_DISPATCH, OrderId, QuoteId, UnitOfWorkFactory,
    round_currency, selected_total,
};
use crate::error::{QuoteError, QuoteResult};

pub struct QuoteToOrderConverter {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl QuoteToOrderConverter {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    pub async fn convert(&self, tenant_id: &TenantId, quote_id: QuoteId) -> QuoteResult<OrderId> {
        match self.try_convert(tenant_id, quote_id).await {
            Ok(order_id) => {
                counter!("cpq_orders_converted_total").increment(1);
                info!(%quote_id, %order_id, "Quote converted to order");
                Ok(order_id)
            }
            Err(e) => {
                counter!("cpq_conversion_rejected_total", "reason" => e.reason()).increment(1);
                if e.status_code() >= 500 {
                    error!(%quote_id, error = %e, "Quote conversion failed");
                } else {
                    warn!(%quote_id, error = %e, "Quote conversion rejected");
                }
                Err(e)
            }
        }
    }

    async fn try_convert(&self, tenant_id: &TenantId, quote_id: QuoteId) -> QuoteResult<OrderId> {
        let uow = self.uow_factory.begin().await?;

        let quote = uow
            .quotes()
            .find_for_update(tenant_id, quote_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Quote {} not found", quote_id)))?;

        let selected = uow.quote_items().find_selected(tenant_id, quote_id).await?;
        if selected.is_empty() {
            return Err(QuoteError::NoItemsSelected { quote_id });
        }

        let pairs: BTreeSet<_> = selected
            .iter()
            .map(|i| (i.product_id, i.attribute_id))
            .collect();
        if pairs.len() != selected.len() {
            return Err(AppError::validation(format!(
                "Quote {} has several selected items for the same product and attribute",
                quote_id
            ))
            .into());
        }

        let pairs: Vec<_> = pairs.into_iter().collect();
        let dispatched = uow
            .orders()
            .find_dispatched(tenant_id, quote_id, &pairs)
            .await?;
        if !dispatched.is_empty() {
            return Err(QuoteError::AlreadyDispatched(dispatched));
        }

        let order_id = uow
            .orders()
            .insert(
                tenant_id,
                &NewOrder {
                    quote_id: Some(quote_id),
                    dealer_id: quote.dealer_id,
                    user_id: quote.user_id,
                    total_price: round_currency(selected_total(&selected)),
                    status: ORDER_STATUS_FOR_DISPATCH.to_string(),
                },
            )
            .await?;

        let lines: Vec<_> = selected
            .iter()
            .map(|item| NewOrderLine {
                product_id: item.product_id,
                attribute_id: item.attribute_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.total_price(),
                serial_number: None,
            })
            .collect();
        uow.orders()
            .insert_lines(tenant_id, order_id, Some(quote_id), &lines)
            .await?;

        uow.commit().await?;
        Ok(order_id)
    }
}
