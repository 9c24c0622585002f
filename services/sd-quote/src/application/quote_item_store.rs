//! 报价行保存与读取

use std::collections::HashMap;
use std::sync::Arc;

use cpq_common::TenantId;
use cpq_errors::AppError;
use rust_decimal::Decimal;
use tracing::info;

use crate::application::{OverrideValidator, PriceBandLookup, QuoteItemsView};
use crate::domain::{
    LineDraft, QuoteId, QuoteItem, QuoteItemId, QuoteItemUpdate, UnitOfWorkFactory,
    selected_total,
};
use crate::error::{QuoteError, QuoteResult};

pub struct QuoteItemStore {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    validator: Arc<OverrideValidator>,
    lookup: Arc<dyn PriceBandLookup>,
}

impl QuoteItemStore {
    pub fn new(
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        validator: Arc<OverrideValidator>,
        lookup: Arc<dyn PriceBandLookup>,
    ) -> Self {
        Self {
            uow_factory,
            validator,
            lookup,
        }
    }

    /// 整批保存报价行
    ///
    /// 任一行不合规或写入失败时整批回滚。
    pub async fn save(
        &self,
        tenant_id: &TenantId,
        quote_id: QuoteId,
        lines: Vec<LineDraft>,
    ) -> QuoteResult<()> {
        // 1. 报价单与现有行
        let (dealer_id, existing) = {
            let uow = self.uow_factory.begin().await?;
            let quote = uow
                .quotes()
                .find_by_id(tenant_id, quote_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Quote {} not found", quote_id)))?;
            let items = uow.quote_items().find_by_quote(tenant_id, quote_id).await?;
            uow.commit().await?;
            (quote.dealer_id, items)
        };

        let existing: HashMap<QuoteItemId, QuoteItem> =
            existing.into_iter().map(|i| (i.id, i)).collect();
        let missing: Vec<_> = lines
            .iter()
            .map(|l| l.quote_item_id)
            .filter(|id| !existing.contains_key(id))
            .collect();
        if !missing.is_empty() {
            return Err(QuoteError::ItemsNotSaved(missing));
        }

        // 手动改价期间不允许切换规格
        if let Some(line) = lines
            .iter()
            .find(|l| l.is_override && l.attribute_id != existing[&l.quote_item_id].attribute_id)
        {
            return Err(QuoteError::InvalidState {
                quote_item_id: line.quote_item_id,
                reason: "attribute cannot change while a manual price override is active"
                    .to_string(),
            });
        }

        // 2. 改价校验
        self.validator
            .validate_batch(tenant_id, dealer_id, &lines)
            .await?;

        // 3. 确定写入价格：只有手动改价行采用客户端价格
        let mut updates = Vec::with_capacity(lines.len());
        for line in &lines {
            let current = &existing[&line.quote_item_id];
            let unit_price = if line.is_override {
                line.unit_price.ok_or_else(|| {
                    AppError::internal(format!(
                        "Override on item {} passed validation without a price",
                        line.quote_item_id
                    ))
                })?
            } else if line.attribute_id != current.attribute_id || current.is_override {
                self.lookup
                    .lookup(tenant_id, line.attribute_id, dealer_id)
                    .await?
                    .price
            } else {
                current.unit_price
            };

            if unit_price < Decimal::ZERO {
                return Err(AppError::validation(format!(
                    "Unit price for item {} must not be negative",
                    line.quote_item_id
                ))
                .into());
            }

            updates.push(QuoteItemUpdate {
                quote_item_id: line.quote_item_id,
                attribute_id: line.attribute_id,
                unit_price,
                is_selected: line.is_selected,
                is_override: line.is_override,
            });
        }

        // 4. 单事务写入
        let uow = self.uow_factory.begin().await?;
        let mut not_saved = Vec::new();
        for update in &updates {
            if !uow.quote_items().update(tenant_id, quote_id, update).await? {
                not_saved.push(update.quote_item_id);
            }
        }
        if !not_saved.is_empty() {
            uow.rollback().await?;
            return Err(QuoteError::ItemsNotSaved(not_saved));
        }
        uow.commit().await?;

        info!(%quote_id, items = updates.len(), "Quote items saved");
        Ok(())
    }

    /// 读取报价行，合计只统计选中行
    pub async fn get_items(&self, tenant_id: &TenantId, quote_id: QuoteId) -> QuoteResult<QuoteItemsView> {
        let uow = self.uow_factory.begin().await?;

        if uow.quotes().find_by_id(tenant_id, quote_id).await?.is_none() {
            return Err(AppError::not_found(format!("Quote {} not found", quote_id)).into());
        }

        let items = uow.quote_items().find_by_quote(tenant_id, quote_id).await?;
        let note = uow
            .notes()
            .first_for_quote(tenant_id, quote_id)
            .await?
            .unwrap_or_default();
        uow.commit().await?;

        let total_sum = selected_total(&items);
        Ok(QuoteItemsView {
            items,
            total_sum,
            note,
        })
    }
}
