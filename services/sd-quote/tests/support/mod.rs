//! 内存版 Unit of Work
//!
//! 每个事务在开始时复制一份状态，提交时整体写回，丢弃即回滚。
//! 同一时刻只有一个事务持有闸门，等价于数据库行锁下的串行执行。

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use cpq_common::{TenantId, UserId};
use cpq_errors::{AppError, AppResult};
use rust_decimal::Decimal;
use sd_quote::domain::*;
use tokio::sync::OwnedMutexGuard;

#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub tenant_id: TenantId,
    pub id: OrderId,
    pub quote_id: Option<QuoteId>,
    pub dealer_id: DealerId,
    pub user_id: UserId,
    pub total_price: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrderLineRecord {
    pub tenant_id: TenantId,
    pub order_id: OrderId,
    pub quote_id: Option<QuoteId>,
    pub line: NewOrderLine,
}

#[derive(Debug, Clone)]
pub struct NoteRecord {
    pub tenant_id: TenantId,
    pub quote_id: QuoteId,
    pub content: String,
    pub created_by: UserId,
}

#[derive(Debug, Clone)]
pub struct ServiceRequestRecord {
    pub tenant_id: TenantId,
    pub id: i64,
    pub dealer_id: DealerId,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FollowUpRecord {
    pub tenant_id: TenantId,
    pub id: FollowUpId,
    pub follow_up: NewFollowUp,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ProductRecord {
    tenant_id: TenantId,
    id: ProductId,
    name: String,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    next_id: i64,
    account_types: Vec<AccountType>,
    dealers: Vec<Dealer>,
    products: Vec<ProductRecord>,
    attributes: Vec<(TenantId, ProductAttribute)>,
    tiers: Vec<(TenantId, PricingTier)>,
    quotes: Vec<Quote>,
    quote_items: Vec<(TenantId, QuoteItem)>,
    orders: Vec<OrderRecord>,
    order_lines: Vec<OrderLineRecord>,
    notes: Vec<NoteRecord>,
    service_requests: Vec<ServiceRequestRecord>,
    follow_ups: Vec<FollowUpRecord>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn product_name(&self, tenant_id: &TenantId, id: ProductId) -> String {
        self.products
            .iter()
            .find(|p| &p.tenant_id == tenant_id && p.id == id)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    fn attribute_name(&self, tenant_id: &TenantId, id: AttributeId) -> String {
        self.attributes
            .iter()
            .find(|(t, a)| t == tenant_id && a.id == id)
            .map(|(_, a)| a.name.clone())
            .unwrap_or_default()
    }

    fn dealer(&self, tenant_id: &TenantId, id: DealerId) -> Option<&Dealer> {
        self.dealers
            .iter()
            .find(|d| &d.tenant_id == tenant_id && d.id == id)
    }

    fn has_follow_up(&self, tenant_id: &TenantId, entity_type: EntityType, entity_id: i64) -> bool {
        self.follow_ups.iter().any(|f| {
            &f.tenant_id == tenant_id
                && f.follow_up.entity_type == entity_type
                && f.follow_up.entity_id == entity_id
        })
    }

    /// 所属经销商、业务状态、创建日期
    fn owning_entity(
        &self,
        tenant_id: &TenantId,
        entity_type: EntityType,
        entity_id: i64,
    ) -> Option<(DealerId, String, NaiveDate)> {
        match entity_type {
            EntityType::Quote => self
                .quotes
                .iter()
                .find(|q| &q.tenant_id == tenant_id && q.id.value() == entity_id)
                .map(|q| (q.dealer_id, q.status.to_string(), q.created_at.date_naive())),
            EntityType::Order => self
                .orders
                .iter()
                .find(|o| &o.tenant_id == tenant_id && o.id.value() == entity_id)
                .map(|o| (o.dealer_id, o.status.clone(), o.created_at.date_naive())),
            EntityType::Sr => self
                .service_requests
                .iter()
                .find(|s| &s.tenant_id == tenant_id && s.id == entity_id)
                .map(|s| (s.dealer_id, s.status.clone(), s.created_at.date_naive())),
            EntityType::Lr => None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn source(
        &self,
        tenant_id: &TenantId,
        dealer_id: DealerId,
        entity_type: EntityType,
        entity_id: i64,
        due_date: NaiveDate,
        status: String,
        entity_status: String,
        follow_up_id: Option<FollowUpId>,
    ) -> Option<FollowUpSource> {
        let dealer = self.dealer(tenant_id, dealer_id)?;
        Some(FollowUpSource {
            dealer_id,
            dealer_name: dealer.full_name.clone(),
            is_important: dealer.is_important,
            follow_up_id,
            entity_type,
            entity_id,
            due_date,
            status,
            entity_status,
            origin: if follow_up_id.is_some() {
                FollowUpOrigin::Explicit
            } else {
                FollowUpOrigin::Implicit
            },
        })
    }
}

/// 内存数据库
#[derive(Clone, Default)]
pub struct MemoryDb {
    state: Arc<Mutex<MemoryState>>,
    gate: Arc<tokio::sync::Mutex<()>>,
    failures: Arc<Mutex<HashSet<&'static str>>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> Arc<dyn UnitOfWorkFactory> {
        Arc::new(self.clone())
    }

    /// 让指定操作返回数据库错误，例如 `"orders.insert_lines"`
    pub fn fail_on(&self, operation: &'static str) {
        self.failures.lock().unwrap().insert(operation);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    // ============ 种子数据 ============

    pub fn seed_account_type(&self, tenant_id: &TenantId, name: &str, min: &str, max: &str) -> AccountTypeId {
        self.with_state(|s| {
            let id = AccountTypeId(s.next_id());
            s.account_types.push(AccountType {
                id,
                tenant_id: tenant_id.clone(),
                name: name.to_string(),
                category: AccountCategory::Dealer,
                min_margin_percent: dec(min),
                max_margin_percent: dec(max),
            });
            id
        })
    }

    pub fn seed_dealer(
        &self,
        tenant_id: &TenantId,
        full_name: &str,
        phone: &str,
        account_type: &str,
        kam: Option<UserId>,
    ) -> DealerId {
        self.with_state(|s| {
            let id = DealerId(s.next_id());
            s.dealers.push(Dealer {
                id,
                tenant_id: tenant_id.clone(),
                full_name: full_name.to_string(),
                phone: phone.to_string(),
                account_type: account_type.to_string(),
                account_manager_id: kam,
                is_important: false,
            });
            id
        })
    }

    pub fn mark_important(&self, dealer_id: DealerId) {
        self.with_state(|s| {
            if let Some(d) = s.dealers.iter_mut().find(|d| d.id == dealer_id) {
                d.is_important = true;
            }
        })
    }

    pub fn seed_product(&self, tenant_id: &TenantId, name: &str) -> ProductId {
        self.with_state(|s| {
            let id = ProductId(s.next_id());
            s.products.push(ProductRecord {
                tenant_id: tenant_id.clone(),
                id,
                name: name.to_string(),
            });
            id
        })
    }

    pub fn seed_attribute(&self, tenant_id: &TenantId, product_id: ProductId, name: &str) -> AttributeId {
        self.with_state(|s| {
            let id = AttributeId(s.next_id());
            s.attributes.push((
                tenant_id.clone(),
                ProductAttribute {
                    id,
                    product_id,
                    name: name.to_string(),
                },
            ));
            id
        })
    }

    pub fn seed_tier(
        &self,
        tenant_id: &TenantId,
        attribute_id: AttributeId,
        min_quantity: i32,
        cost_price: &str,
        price: &str,
    ) -> PricingTierId {
        self.with_state(|s| {
            let id = PricingTierId(s.next_id());
            s.tiers.push((
                tenant_id.clone(),
                PricingTier {
                    id,
                    attribute_id,
                    min_quantity,
                    cost_price: dec(cost_price),
                    price: dec(price),
                },
            ));
            id
        })
    }

    pub fn seed_quote(
        &self,
        tenant_id: &TenantId,
        dealer_id: DealerId,
        user_id: UserId,
        status: QuoteStatus,
        created_at: DateTime<Utc>,
    ) -> QuoteId {
        self.with_state(|s| {
            let id = QuoteId(s.next_id());
            s.quotes.push(Quote {
                id,
                tenant_id: tenant_id.clone(),
                dealer_id,
                user_id,
                assigned_kam_id: None,
                total_price: Decimal::ZERO,
                status,
                created_at,
            });
            id
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn seed_quote_item(
        &self,
        tenant_id: &TenantId,
        quote_id: QuoteId,
        product_id: ProductId,
        attribute_id: AttributeId,
        quantity: i32,
        unit_price: &str,
        is_selected: bool,
        is_override: bool,
    ) -> QuoteItemId {
        self.with_state(|s| {
            let id = QuoteItemId(s.next_id());
            let item = QuoteItem {
                id,
                quote_id,
                product_id,
                product_name: s.product_name(tenant_id, product_id),
                attribute_id,
                attribute_name: s.attribute_name(tenant_id, attribute_id),
                quantity,
                unit_price: dec(unit_price),
                is_selected,
                is_override,
            };
            s.quote_items.push((tenant_id.clone(), item));
            id
        })
    }

    pub fn seed_order(
        &self,
        tenant_id: &TenantId,
        quote_id: Option<QuoteId>,
        dealer_id: DealerId,
        status: &str,
        created_at: DateTime<Utc>,
    ) -> OrderId {
        self.with_state(|s| {
            let id = OrderId(s.next_id());
            s.orders.push(OrderRecord {
                tenant_id: tenant_id.clone(),
                id,
                quote_id,
                dealer_id,
                user_id: UserId::new(1),
                total_price: Decimal::ZERO,
                status: status.to_string(),
                created_at,
            });
            id
        })
    }

    pub fn seed_service_request(
        &self,
        tenant_id: &TenantId,
        dealer_id: DealerId,
        status: &str,
        created_at: DateTime<Utc>,
    ) -> i64 {
        self.with_state(|s| {
            let id = s.next_id();
            s.service_requests.push(ServiceRequestRecord {
                tenant_id: tenant_id.clone(),
                id,
                dealer_id,
                status: status.to_string(),
                created_at,
            });
            id
        })
    }

    pub fn seed_follow_up(
        &self,
        tenant_id: &TenantId,
        entity_type: EntityType,
        entity_id: i64,
        status: &str,
        due_date: Option<NaiveDate>,
    ) -> FollowUpId {
        self.with_state(|s| {
            let id = FollowUpId(s.next_id());
            s.follow_ups.push(FollowUpRecord {
                tenant_id: tenant_id.clone(),
                id,
                follow_up: NewFollowUp {
                    entity_type,
                    entity_id,
                    assigned_to: UserId::new(1),
                    created_by: UserId::new(1),
                    status: status.to_string(),
                    due_date,
                    notes: None,
                },
                created_at: Utc::now(),
            });
            id
        })
    }

    // ============ 状态检查 ============

    pub fn dealers(&self, tenant_id: &TenantId) -> Vec<Dealer> {
        self.with_state(|s| {
            s.dealers
                .iter()
                .filter(|d| &d.tenant_id == tenant_id)
                .cloned()
                .collect()
        })
    }

    pub fn quotes(&self, tenant_id: &TenantId) -> Vec<Quote> {
        self.with_state(|s| {
            s.quotes
                .iter()
                .filter(|q| &q.tenant_id == tenant_id)
                .cloned()
                .collect()
        })
    }

    pub fn quote_items(&self, quote_id: QuoteId) -> Vec<QuoteItem> {
        self.with_state(|s| {
            s.quote_items
                .iter()
                .filter(|(_, i)| i.quote_id == quote_id)
                .map(|(_, i)| i.clone())
                .collect()
        })
    }

    pub fn orders(&self) -> Vec<OrderRecord> {
        self.with_state(|s| s.orders.clone())
    }

    pub fn order_lines(&self) -> Vec<OrderLineRecord> {
        self.with_state(|s| s.order_lines.clone())
    }

    pub fn notes(&self) -> Vec<NoteRecord> {
        self.with_state(|s| s.notes.clone())
    }

    pub fn follow_ups(&self) -> Vec<FollowUpRecord> {
        self.with_state(|s| s.follow_ups.clone())
    }
}

#[async_trait]
impl UnitOfWorkFactory for MemoryDb {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let permit = self.gate.clone().lock_owned().await;
        if self.failures.lock().unwrap().contains("begin") {
            return Err(AppError::database("injected failure: begin"));
        }
        let working = self.state.lock().unwrap().clone();

        Ok(Box::new(MemoryUnitOfWork {
            db: self.clone(),
            working: Mutex::new(working),
            _permit: permit,
        }))
    }
}

pub struct MemoryUnitOfWork {
    db: MemoryDb,
    working: Mutex<MemoryState>,
    _permit: OwnedMutexGuard<()>,
}

impl MemoryUnitOfWork {
    fn check(&self, operation: &'static str) -> AppResult<()> {
        if self.db.failures.lock().unwrap().contains(operation) {
            return Err(AppError::database(format!("injected failure: {}", operation)));
        }
        Ok(())
    }

    fn run<T>(&self, operation: &'static str, f: impl FnOnce(&mut MemoryState) -> AppResult<T>) -> AppResult<T> {
        self.check(operation)?;
        f(&mut self.working.lock().unwrap())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn account_types(&self) -> &dyn AccountTypeRepository {
        self
    }

    fn dealers(&self) -> &dyn DealerRepository {
        self
    }

    fn pricing(&self) -> &dyn PricingRepository {
        self
    }

    fn quotes(&self) -> &dyn QuoteRepository {
        self
    }

    fn quote_items(&self) -> &dyn QuoteItemRepository {
        self
    }

    fn orders(&self) -> &dyn OrderRepository {
        self
    }

    fn notes(&self) -> &dyn NoteRepository {
        self
    }

    fn follow_ups(&self) -> &dyn FollowUpRepository {
        self
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.check("commit")?;
        let working = self.working.lock().unwrap().clone();
        *self.db.state.lock().unwrap() = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl AccountTypeRepository for MemoryUnitOfWork {
    async fn find_by_name(&self, tenant_id: &TenantId, name: &str) -> AppResult<Option<AccountType>> {
        self.run("account_types.find_by_name", |s| {
            Ok(s.account_types
                .iter()
                .find(|a| &a.tenant_id == tenant_id && a.name == name)
                .cloned())
        })
    }

    async fn insert(&self, tenant_id: &TenantId, account_type: &NewAccountType) -> AppResult<AccountTypeId> {
        self.run("account_types.insert", |s| {
            if s.account_types
                .iter()
                .any(|a| &a.tenant_id == tenant_id && a.name == account_type.name)
            {
                return Err(AppError::conflict("account_types: duplicate entry"));
            }
            let id = AccountTypeId(s.next_id());
            s.account_types.push(AccountType {
                id,
                tenant_id: tenant_id.clone(),
                name: account_type.name.clone(),
                category: account_type.category,
                min_margin_percent: account_type.min_margin_percent,
                max_margin_percent: account_type.max_margin_percent,
            });
            Ok(id)
        })
    }
}

#[async_trait]
impl DealerRepository for MemoryUnitOfWork {
    async fn find_by_id(&self, tenant_id: &TenantId, id: DealerId) -> AppResult<Option<Dealer>> {
        self.run("dealers.find_by_id", |s| Ok(s.dealer(tenant_id, id).cloned()))
    }

    async fn find_for_update(&self, tenant_id: &TenantId, id: DealerId) -> AppResult<Option<Dealer>> {
        self.run("dealers.find_for_update", |s| Ok(s.dealer(tenant_id, id).cloned()))
    }

    async fn find_by_phone_for_update(&self, tenant_id: &TenantId, phone: &str) -> AppResult<Option<Dealer>> {
        self.run("dealers.find_by_phone_for_update", |s| {
            Ok(s.dealers
                .iter()
                .find(|d| &d.tenant_id == tenant_id && d.phone == phone)
                .cloned())
        })
    }

    async fn insert_if_absent(&self, tenant_id: &TenantId, dealer: &NewDealer) -> AppResult<Option<DealerId>> {
        self.run("dealers.insert_if_absent", |s| {
            if s.dealers
                .iter()
                .any(|d| &d.tenant_id == tenant_id && d.phone == dealer.phone)
            {
                return Ok(None);
            }
            if !s
                .account_types
                .iter()
                .any(|a| &a.tenant_id == tenant_id && a.name == dealer.account_type)
            {
                return Err(AppError::validation("dealers: foreign key constraint violation"));
            }
            let id = DealerId(s.next_id());
            s.dealers.push(Dealer {
                id,
                tenant_id: tenant_id.clone(),
                full_name: dealer.full_name.clone(),
                phone: dealer.phone.clone(),
                account_type: dealer.account_type.clone(),
                account_manager_id: dealer.account_manager_id,
                is_important: false,
            });
            Ok(Some(id))
        })
    }

    async fn claim_account_manager(
        &self,
        tenant_id: &TenantId,
        id: DealerId,
        candidate: UserId,
    ) -> AppResult<KamClaim> {
        self.run("dealers.claim_account_manager", |s| {
            let dealer = s
                .dealers
                .iter_mut()
                .find(|d| &d.tenant_id == tenant_id && d.id == id)
                .ok_or_else(|| AppError::not_found(format!("dealers {} not found", id)))?;
            match dealer.account_manager_id {
                Some(holder) => Ok(KamClaim::AlreadyHeld(holder)),
                None => {
                    dealer.account_manager_id = Some(candidate);
                    Ok(KamClaim::Claimed(candidate))
                }
            }
        })
    }
}

#[async_trait]
impl PricingRepository for MemoryUnitOfWork {
    async fn find_attribute(&self, tenant_id: &TenantId, attribute_id: AttributeId) -> AppResult<Option<ProductAttribute>> {
        self.run("pricing.find_attribute", |s| {
            Ok(s.attributes
                .iter()
                .find(|(t, a)| t == tenant_id && a.id == attribute_id)
                .map(|(_, a)| a.clone()))
        })
    }

    async fn find_tiers(&self, tenant_id: &TenantId, attribute_id: AttributeId) -> AppResult<Vec<PricingTier>> {
        self.run("pricing.find_tiers", |s| {
            Ok(s.tiers
                .iter()
                .filter(|(t, p)| t == tenant_id && p.attribute_id == attribute_id)
                .map(|(_, p)| p.clone())
                .collect())
        })
    }

    async fn tier_exists(&self, tenant_id: &TenantId, attribute_id: AttributeId, min_quantity: i32) -> AppResult<bool> {
        self.run("pricing.tier_exists", |s| {
            Ok(s.tiers.iter().any(|(t, p)| {
                t == tenant_id && p.attribute_id == attribute_id && p.min_quantity == min_quantity
            }))
        })
    }

    async fn insert_tier(&self, tenant_id: &TenantId, tier: &NewPricingTier) -> AppResult<PricingTierId> {
        self.run("pricing.insert_tier", |s| {
            let id = PricingTierId(s.next_id());
            s.tiers.push((
                tenant_id.clone(),
                PricingTier {
                    id,
                    attribute_id: tier.attribute_id,
                    min_quantity: tier.min_quantity,
                    cost_price: tier.cost_price,
                    price: tier.price,
                },
            ));
            Ok(id)
        })
    }
}

#[async_trait]
impl QuoteRepository for MemoryUnitOfWork {
    async fn find_by_id(&self, tenant_id: &TenantId, id: QuoteId) -> AppResult<Option<Quote>> {
        self.run("quotes.find_by_id", |s| {
            Ok(s.quotes
                .iter()
                .find(|q| &q.tenant_id == tenant_id && q.id == id)
                .cloned())
        })
    }

    async fn find_for_update(&self, tenant_id: &TenantId, id: QuoteId) -> AppResult<Option<Quote>> {
        self.run("quotes.find_for_update", |s| {
            Ok(s.quotes
                .iter()
                .find(|q| &q.tenant_id == tenant_id && q.id == id)
                .cloned())
        })
    }

    async fn insert(&self, tenant_id: &TenantId, quote: &NewQuote) -> AppResult<QuoteId> {
        self.run("quotes.insert", |s| {
            let id = QuoteId(s.next_id());
            s.quotes.push(Quote {
                id,
                tenant_id: tenant_id.clone(),
                dealer_id: quote.dealer_id,
                user_id: quote.user_id,
                assigned_kam_id: Some(quote.assigned_kam_id),
                total_price: quote.total_price,
                status: quote.status.clone(),
                created_at: Utc::now(),
            });
            Ok(id)
        })
    }
}

#[async_trait]
impl QuoteItemRepository for MemoryUnitOfWork {
    async fn find_by_quote(&self, tenant_id: &TenantId, quote_id: QuoteId) -> AppResult<Vec<QuoteItem>> {
        self.run("quote_items.find_by_quote", |s| {
            Ok(s.quote_items
                .iter()
                .filter(|(t, i)| t == tenant_id && i.quote_id == quote_id)
                .map(|(_, i)| i.clone())
                .collect())
        })
    }

    async fn find_selected(&self, tenant_id: &TenantId, quote_id: QuoteId) -> AppResult<Vec<QuoteItem>> {
        self.run("quote_items.find_selected", |s| {
            Ok(s.quote_items
                .iter()
                .filter(|(t, i)| t == tenant_id && i.quote_id == quote_id && i.is_selected)
                .map(|(_, i)| i.clone())
                .collect())
        })
    }

    async fn insert_batch(&self, tenant_id: &TenantId, quote_id: QuoteId, items: &[NewQuoteItem]) -> AppResult<()> {
        self.run("quote_items.insert_batch", |s| {
            for item in items {
                let id = QuoteItemId(s.next_id());
                let row = QuoteItem {
                    id,
                    quote_id,
                    product_id: item.product_id,
                    product_name: s.product_name(tenant_id, item.product_id),
                    attribute_id: item.attribute_id,
                    attribute_name: s.attribute_name(tenant_id, item.attribute_id),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    is_selected: true,
                    is_override: false,
                };
                s.quote_items.push((tenant_id.clone(), row));
            }
            Ok(())
        })
    }

    async fn update(&self, tenant_id: &TenantId, quote_id: QuoteId, update: &QuoteItemUpdate) -> AppResult<bool> {
        self.run("quote_items.update", |s| {
            let attribute_name = s.attribute_name(tenant_id, update.attribute_id);
            match s
                .quote_items
                .iter_mut()
                .find(|(t, i)| t == tenant_id && i.quote_id == quote_id && i.id == update.quote_item_id)
            {
                Some((_, item)) => {
                    item.attribute_id = update.attribute_id;
                    item.attribute_name = attribute_name;
                    item.unit_price = update.unit_price;
                    item.is_selected = update.is_selected;
                    item.is_override = update.is_override;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }
}

#[async_trait]
impl OrderRepository for MemoryUnitOfWork {
    async fn find_dispatched(
        &self,
        tenant_id: &TenantId,
        quote_id: QuoteId,
        pairs: &[(ProductId, AttributeId)],
    ) -> AppResult<Vec<DispatchedLine>> {
        self.run("orders.find_dispatched", |s| {
            Ok(s.order_lines
                .iter()
                .filter(|l| &l.tenant_id == tenant_id && l.quote_id == Some(quote_id))
                .filter(|l| pairs.contains(&(l.line.product_id, l.line.attribute_id)))
                .map(|l| DispatchedLine {
                    product_id: l.line.product_id,
                    attribute_id: l.line.attribute_id,
                    product_name: s.product_name(tenant_id, l.line.product_id),
                    order_id: l.order_id,
                })
                .collect())
        })
    }

    async fn insert(&self, tenant_id: &TenantId, order: &NewOrder) -> AppResult<OrderId> {
        self.run("orders.insert", |s| {
            let id = OrderId(s.next_id());
            s.orders.push(OrderRecord {
                tenant_id: tenant_id.clone(),
                id,
                quote_id: order.quote_id,
                dealer_id: order.dealer_id,
                user_id: order.user_id,
                total_price: order.total_price,
                status: order.status.clone(),
                created_at: Utc::now(),
            });
            Ok(id)
        })
    }

    async fn insert_lines(
        &self,
        tenant_id: &TenantId,
        order_id: OrderId,
        quote_id: Option<QuoteId>,
        lines: &[NewOrderLine],
    ) -> AppResult<u64> {
        self.run("orders.insert_lines", |s| {
            // uq_order_lines_quote_product_attribute
            if let Some(quote_id) = quote_id {
                let clash = lines.iter().any(|new| {
                    s.order_lines.iter().any(|l| {
                        l.quote_id == Some(quote_id)
                            && l.line.product_id == new.product_id
                            && l.line.attribute_id == new.attribute_id
                    })
                });
                if clash {
                    return Err(AppError::conflict(
                        "Failed to insert order lines: duplicate entry violates unique constraint",
                    ));
                }
            }
            for line in lines {
                s.order_lines.push(OrderLineRecord {
                    tenant_id: tenant_id.clone(),
                    order_id,
                    quote_id,
                    line: line.clone(),
                });
            }
            Ok(lines.len() as u64)
        })
    }
}

#[async_trait]
impl NoteRepository for MemoryUnitOfWork {
    async fn insert(&self, tenant_id: &TenantId, quote_id: QuoteId, content: &str, created_by: UserId) -> AppResult<()> {
        self.run("notes.insert", |s| {
            s.notes.push(NoteRecord {
                tenant_id: tenant_id.clone(),
                quote_id,
                content: content.to_string(),
                created_by,
            });
            Ok(())
        })
    }

    async fn first_for_quote(&self, tenant_id: &TenantId, quote_id: QuoteId) -> AppResult<Option<String>> {
        self.run("notes.first_for_quote", |s| {
            Ok(s.notes
                .iter()
                .find(|n| &n.tenant_id == tenant_id && n.quote_id == quote_id)
                .map(|n| n.content.clone()))
        })
    }
}

#[async_trait]
impl FollowUpRepository for MemoryUnitOfWork {
    async fn insert(&self, tenant_id: &TenantId, follow_up: &NewFollowUp) -> AppResult<FollowUpId> {
        self.run("follow_ups.insert", |s| {
            let id = FollowUpId(s.next_id());
            s.follow_ups.push(FollowUpRecord {
                tenant_id: tenant_id.clone(),
                id,
                follow_up: follow_up.clone(),
                created_at: Utc::now(),
            });
            Ok(id)
        })
    }

    async fn load_sources(&self, tenant_id: &TenantId) -> AppResult<Vec<FollowUpSource>> {
        self.run("follow_ups.load_sources", |s| {
            let mut sources = Vec::new();

            for f in s.follow_ups.iter().filter(|f| &f.tenant_id == tenant_id) {
                let Some((dealer_id, entity_status, created)) =
                    s.owning_entity(tenant_id, f.follow_up.entity_type, f.follow_up.entity_id)
                else {
                    continue;
                };
                sources.extend(s.source(
                    tenant_id,
                    dealer_id,
                    f.follow_up.entity_type,
                    f.follow_up.entity_id,
                    f.follow_up.due_date.unwrap_or(created),
                    f.follow_up.status.clone(),
                    entity_status,
                    Some(f.id),
                ));
            }

            for q in s.quotes.iter().filter(|q| &q.tenant_id == tenant_id) {
                if q.status.is_open() && !s.has_follow_up(tenant_id, EntityType::Quote, q.id.value()) {
                    sources.extend(s.source(
                        tenant_id,
                        q.dealer_id,
                        EntityType::Quote,
                        q.id.value(),
                        q.created_at.date_naive(),
                        q.status.to_string(),
                        q.status.to_string(),
                        None,
                    ));
                }
            }

            for o in s.orders.iter().filter(|o| &o.tenant_id == tenant_id) {
                let pending = matches!(o.status.as_str(), "Pending" | "For Dispatch");
                if pending && !s.has_follow_up(tenant_id, EntityType::Order, o.id.value()) {
                    sources.extend(s.source(
                        tenant_id,
                        o.dealer_id,
                        EntityType::Order,
                        o.id.value(),
                        o.created_at.date_naive(),
                        o.status.clone(),
                        o.status.clone(),
                        None,
                    ));
                }
            }

            for r in s.service_requests.iter().filter(|r| &r.tenant_id == tenant_id) {
                let open = !matches!(r.status.as_str(), "Completed" | "Closed");
                if open && !s.has_follow_up(tenant_id, EntityType::Sr, r.id) {
                    sources.extend(s.source(
                        tenant_id,
                        r.dealer_id,
                        EntityType::Sr,
                        r.id,
                        r.created_at.date_naive(),
                        r.status.clone(),
                        r.status.clone(),
                        None,
                    ));
                }
            }

            Ok(sources)
        })
    }
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// 指定日期零点（UTC）
pub fn at(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
