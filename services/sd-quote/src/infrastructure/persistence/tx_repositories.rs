//! 事务感知的 Repository 实现
//!
//! 所有 Repository 共享同一个事务，用于 Unit of Work 模式。

use std::sync::Arc;

use async_trait::async_trait;
use cpq_adapter_postgres::{NullableClaim, map_sqlx_error};
use cpq_common::{TenantId, UserId};
use cpq_errors::{AppError, AppResult};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use tokio::sync::Mutex;

use super::rows::{
    AccountTypeRow, AttributeRow, DealerRow, DispatchedLineRow, FollowUpSourceRow,
    PricingTierRow, QuoteItemRow, QuoteRow,
};
use crate::domain::{
    AccountType, AccountTypeId, AccountTypeRepository, AttributeId, Dealer, DealerId,
    DealerRepository, DispatchedLine, FollowUpId, FollowUpRepository, FollowUpSource, KamClaim,
    NewAccountType, NewDealer, NewFollowUp, NewOrder, NewOrderLine, NewPricingTier, NewQuote,
    NewQuoteItem, NoteRepository, OrderId, OrderRepository, PricingRepository, PricingTier,
    PricingTierId, ProductAttribute, ProductId, Quote, QuoteId, QuoteItem, QuoteItemRepository,
    QuoteItemUpdate, QuoteRepository,
};

/// 共享事务类型
pub(super) type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// 宏：定义一个简单的 TxRepository 结构体
macro_rules! define_tx_repo {
    ($name:ident) => {
        pub struct $name {
            tx: SharedTx,
        }

        impl $name {
            pub fn new(tx: SharedTx) -> Self {
                Self { tx }
            }
        }
    };
}

define_tx_repo!(TxAccountTypeRepository);
define_tx_repo!(TxDealerRepository);
define_tx_repo!(TxPricingRepository);
define_tx_repo!(TxQuoteRepository);
define_tx_repo!(TxQuoteItemRepository);
define_tx_repo!(TxOrderRepository);
define_tx_repo!(TxNoteRepository);
define_tx_repo!(TxFollowUpRepository);

/// 取出事务，已提交或回滚后返回错误
macro_rules! tx_of {
    ($guard:ident) => {
        $guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?
    };
}

/// dealers.account_manager_id 的认领
const DEALER_KAM_CLAIM: NullableClaim =
    NullableClaim::new("dealers", "dealer_id", "tenant_id", "account_manager_id");

const DEALER_COLUMNS: &str =
    "dealer_id, tenant_id, full_name, phone, account_type, account_manager_id, is_important";

const QUOTE_COLUMNS: &str =
    "quote_id, tenant_id, dealer_id, user_id, assigned_kam_id, total_price, status, created_at";

const QUOTE_ITEM_SELECT: &str = r#"
    SELECT qi.quote_item_id, qi.quote_id, qi.product_id, p.name AS product_name,
           qi.attribute_id, pa.name AS attribute_name, qi.quantity, qi.unit_price,
           qi.is_selected, qi.is_override
    FROM quotation_items qi
    JOIN products p ON p.product_id = qi.product_id
    JOIN product_attributes pa ON pa.attribute_id = qi.attribute_id
    WHERE qi.tenant_id = $1 AND qi.quote_id = $2
"#;

// =============================================================================
// AccountTypeRepository 实现
// =============================================================================

#[async_trait]
impl AccountTypeRepository for TxAccountTypeRepository {
    async fn find_by_name(&self, tenant_id: &TenantId, name: &str) -> AppResult<Option<AccountType>> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let row = sqlx::query_as::<_, AccountTypeRow>(
            r#"
            SELECT account_type_id, tenant_id, name, category, min_margin_percent, max_margin_percent
            FROM account_types
            WHERE tenant_id = $1 AND name = $2
            "#,
        )
        .bind(tenant_id.0)
        .bind(name)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to find account type", e))?;

        row.map(AccountTypeRow::into_account_type).transpose()
    }

    async fn insert(&self, tenant_id: &TenantId, account_type: &NewAccountType) -> AppResult<AccountTypeId> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO account_types (tenant_id, name, category, min_margin_percent, max_margin_percent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING account_type_id
            "#,
        )
        .bind(tenant_id.0)
        .bind(&account_type.name)
        .bind(account_type.category.as_str())
        .bind(account_type.min_margin_percent)
        .bind(account_type.max_margin_percent)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert account type", e))?;

        Ok(AccountTypeId(id))
    }
}

// =============================================================================
// DealerRepository 实现
// =============================================================================

#[async_trait]
impl DealerRepository for TxDealerRepository {
    async fn find_by_id(&self, tenant_id: &TenantId, id: DealerId) -> AppResult<Option<Dealer>> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let row = sqlx::query_as::<_, DealerRow>(&format!(
            "SELECT {DEALER_COLUMNS} FROM dealers WHERE tenant_id = $1 AND dealer_id = $2"
        ))
        .bind(tenant_id.0)
        .bind(id.0)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to find dealer", e))?;

        Ok(row.map(Dealer::from))
    }

    async fn find_for_update(&self, tenant_id: &TenantId, id: DealerId) -> AppResult<Option<Dealer>> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let row = sqlx::query_as::<_, DealerRow>(&format!(
            "SELECT {DEALER_COLUMNS} FROM dealers WHERE tenant_id = $1 AND dealer_id = $2 FOR UPDATE"
        ))
        .bind(tenant_id.0)
        .bind(id.0)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to lock dealer", e))?;

        Ok(row.map(Dealer::from))
    }

    async fn find_by_phone_for_update(
        &self,
        tenant_id: &TenantId,
        phone: &str,
    ) -> AppResult<Option<Dealer>> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let row = sqlx::query_as::<_, DealerRow>(&format!(
            "SELECT {DEALER_COLUMNS} FROM dealers WHERE tenant_id = $1 AND phone = $2 FOR UPDATE"
        ))
        .bind(tenant_id.0)
        .bind(phone)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to lock dealer by phone", e))?;

        Ok(row.map(Dealer::from))
    }

    async fn insert_if_absent(&self, tenant_id: &TenantId, dealer: &NewDealer) -> AppResult<Option<DealerId>> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        // 并发插入同一手机号时阻塞到对方提交，随后 DO NOTHING
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO dealers (tenant_id, full_name, phone, account_type, account_manager_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (tenant_id, phone) DO NOTHING
            RETURNING dealer_id
            "#,
        )
        .bind(tenant_id.0)
        .bind(&dealer.full_name)
        .bind(&dealer.phone)
        .bind(&dealer.account_type)
        .bind(dealer.account_manager_id.map(|u| u.0))
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert dealer", e))?;

        Ok(row.map(|(id,)| DealerId(id)))
    }

    async fn claim_account_manager(
        &self,
        tenant_id: &TenantId,
        id: DealerId,
        candidate: UserId,
    ) -> AppResult<KamClaim> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let outcome = DEALER_KAM_CLAIM
            .claim(&mut **tx, id.0, tenant_id.0, candidate.0)
            .await?;

        let kam = UserId(outcome.holder());
        Ok(if outcome.is_claimed() {
            KamClaim::Claimed(kam)
        } else {
            KamClaim::AlreadyHeld(kam)
        })
    }
}

// =============================================================================
// PricingRepository 实现
// =============================================================================

#[async_trait]
impl PricingRepository for TxPricingRepository {
    async fn find_attribute(
        &self,
        tenant_id: &TenantId,
        attribute_id: AttributeId,
    ) -> AppResult<Option<ProductAttribute>> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let row = sqlx::query_as::<_, AttributeRow>(
            "SELECT attribute_id, product_id, name FROM product_attributes WHERE tenant_id = $1 AND attribute_id = $2",
        )
        .bind(tenant_id.0)
        .bind(attribute_id.0)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to find product attribute", e))?;

        Ok(row.map(ProductAttribute::from))
    }

    async fn find_tiers(&self, tenant_id: &TenantId, attribute_id: AttributeId) -> AppResult<Vec<PricingTier>> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let rows = sqlx::query_as::<_, PricingTierRow>(
            r#"
            SELECT pricing_id, attribute_id, min_quantity, cost_price, price
            FROM product_pricing
            WHERE tenant_id = $1 AND attribute_id = $2
            ORDER BY min_quantity
            "#,
        )
        .bind(tenant_id.0)
        .bind(attribute_id.0)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to load pricing tiers", e))?;

        Ok(rows.into_iter().map(PricingTier::from).collect())
    }

    async fn tier_exists(
        &self,
        tenant_id: &TenantId,
        attribute_id: AttributeId,
        min_quantity: i32,
    ) -> AppResult<bool> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM product_pricing
                WHERE tenant_id = $1 AND attribute_id = $2 AND min_quantity = $3
            )
            "#,
        )
        .bind(tenant_id.0)
        .bind(attribute_id.0)
        .bind(min_quantity)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to check pricing tier", e))?;

        Ok(exists)
    }

    async fn insert_tier(&self, tenant_id: &TenantId, tier: &NewPricingTier) -> AppResult<PricingTierId> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO product_pricing (tenant_id, attribute_id, min_quantity, cost_price, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING pricing_id
            "#,
        )
        .bind(tenant_id.0)
        .bind(tier.attribute_id.0)
        .bind(tier.min_quantity)
        .bind(tier.cost_price)
        .bind(tier.price)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert pricing tier", e))?;

        Ok(PricingTierId(id))
    }
}

// =============================================================================
// QuoteRepository 实现
// =============================================================================

#[async_trait]
impl QuoteRepository for TxQuoteRepository {
    async fn find_by_id(&self, tenant_id: &TenantId, id: QuoteId) -> AppResult<Option<Quote>> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let row = sqlx::query_as::<_, QuoteRow>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotations WHERE tenant_id = $1 AND quote_id = $2"
        ))
        .bind(tenant_id.0)
        .bind(id.0)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to find quote", e))?;

        Ok(row.map(Quote::from))
    }

    async fn find_for_update(&self, tenant_id: &TenantId, id: QuoteId) -> AppResult<Option<Quote>> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let row = sqlx::query_as::<_, QuoteRow>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotations WHERE tenant_id = $1 AND quote_id = $2 FOR UPDATE"
        ))
        .bind(tenant_id.0)
        .bind(id.0)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to lock quote", e))?;

        Ok(row.map(Quote::from))
    }

    async fn insert(&self, tenant_id: &TenantId, quote: &NewQuote) -> AppResult<QuoteId> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO quotations (tenant_id, dealer_id, user_id, assigned_kam_id, total_price, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING quote_id
            "#,
        )
        .bind(tenant_id.0)
        .bind(quote.dealer_id.0)
        .bind(quote.user_id.0)
        .bind(quote.assigned_kam_id.0)
        .bind(quote.total_price)
        .bind(quote.status.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert quote", e))?;

        Ok(QuoteId(id))
    }
}

// =============================================================================
// QuoteItemRepository 实现
// =============================================================================

#[async_trait]
impl QuoteItemRepository for TxQuoteItemRepository {
    async fn find_by_quote(&self, tenant_id: &TenantId, quote_id: QuoteId) -> AppResult<Vec<QuoteItem>> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let rows = sqlx::query_as::<_, QuoteItemRow>(&format!(
            "{QUOTE_ITEM_SELECT} ORDER BY qi.quote_item_id"
        ))
        .bind(tenant_id.0)
        .bind(quote_id.0)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to load quote items", e))?;

        Ok(rows.into_iter().map(QuoteItem::from).collect())
    }

    async fn find_selected(&self, tenant_id: &TenantId, quote_id: QuoteId) -> AppResult<Vec<QuoteItem>> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let rows = sqlx::query_as::<_, QuoteItemRow>(&format!(
            "{QUOTE_ITEM_SELECT} AND qi.is_selected ORDER BY qi.quote_item_id"
        ))
        .bind(tenant_id.0)
        .bind(quote_id.0)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to load selected quote items", e))?;

        Ok(rows.into_iter().map(QuoteItem::from).collect())
    }

    async fn insert_batch(
        &self,
        tenant_id: &TenantId,
        quote_id: QuoteId,
        items: &[NewQuoteItem],
    ) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let product_ids: Vec<i64> = items.iter().map(|i| i.product_id.0).collect();
        let attribute_ids: Vec<i64> = items.iter().map(|i| i.attribute_id.0).collect();
        let quantities: Vec<i32> = items.iter().map(|i| i.quantity).collect();
        let unit_prices: Vec<Decimal> = items.iter().map(|i| i.unit_price).collect();

        sqlx::query(
            r#"
            INSERT INTO quotation_items (tenant_id, quote_id, product_id, attribute_id, quantity, unit_price)
            SELECT $1, $2, t.product_id, t.attribute_id, t.quantity, t.unit_price
            FROM UNNEST($3::bigint[], $4::bigint[], $5::int[], $6::numeric[])
                AS t(product_id, attribute_id, quantity, unit_price)
            "#,
        )
        .bind(tenant_id.0)
        .bind(quote_id.0)
        .bind(&product_ids)
        .bind(&attribute_ids)
        .bind(&quantities)
        .bind(&unit_prices)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert quote items", e))?;

        Ok(())
    }

    async fn update(
        &self,
        tenant_id: &TenantId,
        quote_id: QuoteId,
        update: &QuoteItemUpdate,
    ) -> AppResult<bool> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let result = sqlx::query(
            r#"
            UPDATE quotation_items
            SET attribute_id = $4, unit_price = $5, is_selected = $6, is_override = $7
            WHERE tenant_id = $1 AND quote_id = $2 AND quote_item_id = $3
            "#,
        )
        .bind(tenant_id.0)
        .bind(quote_id.0)
        .bind(update.quote_item_id.0)
        .bind(update.attribute_id.0)
        .bind(update.unit_price)
        .bind(update.is_selected)
        .bind(update.is_override)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to update quote item", e))?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// OrderRepository 实现
// =============================================================================

#[async_trait]
impl OrderRepository for TxOrderRepository {
    async fn find_dispatched(
        &self,
        tenant_id: &TenantId,
        quote_id: QuoteId,
        pairs: &[(ProductId, AttributeId)],
    ) -> AppResult<Vec<DispatchedLine>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let product_ids: Vec<i64> = pairs.iter().map(|(p, _)| p.0).collect();
        let attribute_ids: Vec<i64> = pairs.iter().map(|(_, a)| a.0).collect();

        let rows = sqlx::query_as::<_, DispatchedLineRow>(
            r#"
            SELECT ol.product_id, ol.attribute_id, p.name AS product_name, ol.order_id
            FROM order_lines ol
            JOIN orders o ON o.order_id = ol.order_id
            JOIN products p ON p.product_id = ol.product_id
            WHERE o.tenant_id = $1
              AND o.quote_id = $2
              AND (ol.product_id, ol.attribute_id) IN (
                  SELECT * FROM UNNEST($3::bigint[], $4::bigint[])
              )
            ORDER BY ol.order_line_id
            "#,
        )
        .bind(tenant_id.0)
        .bind(quote_id.0)
        .bind(&product_ids)
        .bind(&attribute_ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to check dispatched items", e))?;

        Ok(rows.into_iter().map(DispatchedLine::from).collect())
    }

    async fn insert(&self, tenant_id: &TenantId, order: &NewOrder) -> AppResult<OrderId> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO orders (tenant_id, quote_id, dealer_id, user_id, total_price, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING order_id
            "#,
        )
        .bind(tenant_id.0)
        .bind(order.quote_id.map(|q| q.0))
        .bind(order.dealer_id.0)
        .bind(order.user_id.0)
        .bind(order.total_price)
        .bind(&order.status)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert order", e))?;

        Ok(OrderId(id))
    }

    async fn insert_lines(
        &self,
        tenant_id: &TenantId,
        order_id: OrderId,
        quote_id: Option<QuoteId>,
        lines: &[NewOrderLine],
    ) -> AppResult<u64> {
        if lines.is_empty() {
            return Ok(0);
        }

        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let product_ids: Vec<i64> = lines.iter().map(|l| l.product_id.0).collect();
        let attribute_ids: Vec<i64> = lines.iter().map(|l| l.attribute_id.0).collect();
        let quantities: Vec<i32> = lines.iter().map(|l| l.quantity).collect();
        let unit_prices: Vec<Decimal> = lines.iter().map(|l| l.unit_price).collect();
        let totals: Vec<Decimal> = lines.iter().map(|l| l.total_price).collect();
        let serials: Vec<Option<String>> = lines.iter().map(|l| l.serial_number.clone()).collect();

        // 部分唯一索引 uq_order_lines_quote_product_attribute 兜底，冲突映射为 Conflict
        let result = sqlx::query(
            r#"
            INSERT INTO order_lines
                (tenant_id, order_id, quote_id, product_id, attribute_id, quantity, unit_price, total_price, serial_number)
            SELECT $1, $2, $3, t.product_id, t.attribute_id, t.quantity, t.unit_price, t.total_price, t.serial_number
            FROM UNNEST($4::bigint[], $5::bigint[], $6::int[], $7::numeric[], $8::numeric[], $9::varchar[])
                AS t(product_id, attribute_id, quantity, unit_price, total_price, serial_number)
            "#,
        )
        .bind(tenant_id.0)
        .bind(order_id.0)
        .bind(quote_id.map(|q| q.0))
        .bind(&product_ids)
        .bind(&attribute_ids)
        .bind(&quantities)
        .bind(&unit_prices)
        .bind(&totals)
        .bind(&serials)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert order lines", e))?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// NoteRepository 实现
// =============================================================================

#[async_trait]
impl NoteRepository for TxNoteRepository {
    async fn insert(
        &self,
        tenant_id: &TenantId,
        quote_id: QuoteId,
        content: &str,
        created_by: UserId,
    ) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        sqlx::query("INSERT INTO notes (tenant_id, quote_id, content, created_by) VALUES ($1, $2, $3, $4)")
            .bind(tenant_id.0)
            .bind(quote_id.0)
            .bind(content)
            .bind(created_by.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("Failed to insert note", e))?;

        Ok(())
    }

    async fn first_for_quote(&self, tenant_id: &TenantId, quote_id: QuoteId) -> AppResult<Option<String>> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT content FROM notes
            WHERE tenant_id = $1 AND quote_id = $2
            ORDER BY created_at, note_id
            LIMIT 1
            "#,
        )
        .bind(tenant_id.0)
        .bind(quote_id.0)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to load note", e))?;

        Ok(row.map(|(content,)| content))
    }
}

// =============================================================================
// FollowUpRepository 实现
// =============================================================================

/// 显式跟进记录：按 entity_type 关联到对应业务表，解析出所属经销商
///
/// 隐式跟进：仍处于待办状态且没有任何跟进记录的报价单、订单和服务请求
const FOLLOW_UP_SOURCES_SQL: &str = r#"
    SELECT d.dealer_id, d.full_name AS dealer_name, d.is_important,
           f.follow_up_id, f.entity_type, f.entity_id,
           COALESCE(f.due_date, e.created_at::date) AS due_date,
           f.status, e.entity_status
    FROM follow_ups f
    JOIN LATERAL (
        SELECT q.dealer_id, q.status AS entity_status, q.created_at
        FROM quotations q
        WHERE f.entity_type = 'quote' AND q.tenant_id = f.tenant_id AND q.quote_id = f.entity_id
        UNION ALL
        SELECT o.dealer_id, o.status, o.created_at
        FROM orders o
        WHERE f.entity_type = 'order' AND o.tenant_id = f.tenant_id AND o.order_id = f.entity_id
        UNION ALL
        SELECT s.dealer_id, s.status, s.created_at
        FROM service_requests s
        WHERE f.entity_type = 'sr' AND s.tenant_id = f.tenant_id AND s.service_request_id = f.entity_id
    ) e ON TRUE
    JOIN dealers d ON d.dealer_id = e.dealer_id
    WHERE f.tenant_id = $1 AND f.entity_type IN ('quote', 'order', 'sr')

    UNION ALL

    SELECT d.dealer_id, d.full_name, d.is_important,
           NULL::bigint, 'quote'::varchar, q.quote_id, q.created_at::date, q.status, q.status
    FROM quotations q
    JOIN dealers d ON d.dealer_id = q.dealer_id
    WHERE q.tenant_id = $1
      AND q.status NOT IN ('Finalized', 'Cancelled')
      AND NOT EXISTS (
          SELECT 1 FROM follow_ups f
          WHERE f.tenant_id = q.tenant_id AND f.entity_type = 'quote' AND f.entity_id = q.quote_id
      )

    UNION ALL

    SELECT d.dealer_id, d.full_name, d.is_important,
           NULL::bigint, 'order'::varchar, o.order_id, o.created_at::date, o.status, o.status
    FROM orders o
    JOIN dealers d ON d.dealer_id = o.dealer_id
    WHERE o.tenant_id = $1
      AND o.status IN ('Pending', 'For Dispatch')
      AND NOT EXISTS (
          SELECT 1 FROM follow_ups f
          WHERE f.tenant_id = o.tenant_id AND f.entity_type = 'order' AND f.entity_id = o.order_id
      )

    UNION ALL

    SELECT d.dealer_id, d.full_name, d.is_important,
           NULL::bigint, 'sr'::varchar, s.service_request_id, s.created_at::date, s.status, s.status
    FROM service_requests s
    JOIN dealers d ON d.dealer_id = s.dealer_id
    WHERE s.tenant_id = $1
      AND s.status NOT IN ('Completed', 'Closed')
      AND NOT EXISTS (
          SELECT 1 FROM follow_ups f
          WHERE f.tenant_id = s.tenant_id AND f.entity_type = 'sr' AND f.entity_id = s.service_request_id
      )
"#;

#[async_trait]
impl FollowUpRepository for TxFollowUpRepository {
    async fn insert(&self, tenant_id: &TenantId, follow_up: &NewFollowUp) -> AppResult<FollowUpId> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO follow_ups (tenant_id, entity_type, entity_id, assigned_to, created_by, status, due_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING follow_up_id
            "#,
        )
        .bind(tenant_id.0)
        .bind(follow_up.entity_type.as_str())
        .bind(follow_up.entity_id)
        .bind(follow_up.assigned_to.0)
        .bind(follow_up.created_by.0)
        .bind(&follow_up.status)
        .bind(follow_up.due_date)
        .bind(&follow_up.notes)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert follow-up", e))?;

        Ok(FollowUpId(id))
    }

    async fn load_sources(&self, tenant_id: &TenantId) -> AppResult<Vec<FollowUpSource>> {
        let mut guard = self.tx.lock().await;
        let tx = tx_of!(guard);

        let rows = sqlx::query_as::<_, FollowUpSourceRow>(FOLLOW_UP_SOURCES_SQL)
            .bind(tenant_id.0)
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("Failed to load follow-ups", e))?;

        rows.into_iter().map(FollowUpSourceRow::into_source).collect()
    }
}
