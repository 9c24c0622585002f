//! 数据库行结构与领域对象的转换

use chrono::{DateTime, NaiveDate, Utc};
use cpq_common::{TenantId, UserId};
use cpq_errors::AppResult;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    AccountCategory, AccountType, AccountTypeId, AttributeId, Dealer, DealerId, DispatchedLine,
    EntityType, FollowUpId, FollowUpOrigin, FollowUpSource, OrderId, PricingTier, PricingTierId,
    ProductAttribute, ProductId, Quote, QuoteId, QuoteItem, QuoteItemId, QuoteStatus,
};

#[derive(sqlx::FromRow)]
pub(super) struct AccountTypeRow {
    account_type_id: i64,
    tenant_id: Uuid,
    name: String,
    category: String,
    min_margin_percent: Decimal,
    max_margin_percent: Decimal,
}

impl AccountTypeRow {
    pub(super) fn into_account_type(self) -> AppResult<AccountType> {
        Ok(AccountType {
            id: AccountTypeId(self.account_type_id),
            tenant_id: TenantId::from_uuid(self.tenant_id),
            name: self.name,
            category: self.category.parse::<AccountCategory>()?,
            min_margin_percent: self.min_margin_percent,
            max_margin_percent: self.max_margin_percent,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct DealerRow {
    dealer_id: i64,
    tenant_id: Uuid,
    full_name: String,
    phone: String,
    account_type: String,
    account_manager_id: Option<i64>,
    is_important: bool,
}

impl From<DealerRow> for Dealer {
    fn from(row: DealerRow) -> Self {
        Dealer {
            id: DealerId(row.dealer_id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            full_name: row.full_name,
            phone: row.phone,
            account_type: row.account_type,
            account_manager_id: row.account_manager_id.map(UserId),
            is_important: row.is_important,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct AttributeRow {
    attribute_id: i64,
    product_id: i64,
    name: String,
}

impl From<AttributeRow> for ProductAttribute {
    fn from(row: AttributeRow) -> Self {
        ProductAttribute {
            id: AttributeId(row.attribute_id),
            product_id: ProductId(row.product_id),
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct PricingTierRow {
    pricing_id: i64,
    attribute_id: i64,
    min_quantity: i32,
    cost_price: Decimal,
    price: Decimal,
}

impl From<PricingTierRow> for PricingTier {
    fn from(row: PricingTierRow) -> Self {
        PricingTier {
            id: PricingTierId(row.pricing_id),
            attribute_id: AttributeId(row.attribute_id),
            min_quantity: row.min_quantity,
            cost_price: row.cost_price,
            price: row.price,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct QuoteRow {
    quote_id: i64,
    tenant_id: Uuid,
    dealer_id: i64,
    user_id: i64,
    assigned_kam_id: Option<i64>,
    total_price: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<QuoteRow> for Quote {
    fn from(row: QuoteRow) -> Self {
        Quote {
            id: QuoteId(row.quote_id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            dealer_id: DealerId(row.dealer_id),
            user_id: UserId(row.user_id),
            assigned_kam_id: row.assigned_kam_id.map(UserId),
            total_price: row.total_price,
            status: QuoteStatus::parse(&row.status),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct QuoteItemRow {
    quote_item_id: i64,
    quote_id: i64,
    product_id: i64,
    product_name: String,
    attribute_id: i64,
    attribute_name: String,
    quantity: i32,
    unit_price: Decimal,
    is_selected: bool,
    is_override: bool,
}

impl From<QuoteItemRow> for QuoteItem {
    fn from(row: QuoteItemRow) -> Self {
        QuoteItem {
            id: QuoteItemId(row.quote_item_id),
            quote_id: QuoteId(row.quote_id),
            product_id: ProductId(row.product_id),
            product_name: row.product_name,
            attribute_id: AttributeId(row.attribute_id),
            attribute_name: row.attribute_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            is_selected: row.is_selected,
            is_override: row.is_override,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct DispatchedLineRow {
    product_id: i64,
    attribute_id: i64,
    product_name: String,
    order_id: i64,
}

impl From<DispatchedLineRow> for DispatchedLine {
    fn from(row: DispatchedLineRow) -> Self {
        DispatchedLine {
            product_id: ProductId(row.product_id),
            attribute_id: AttributeId(row.attribute_id),
            product_name: row.product_name,
            order_id: OrderId(row.order_id),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct FollowUpSourceRow {
    dealer_id: i64,
    dealer_name: String,
    is_important: bool,
    follow_up_id: Option<i64>,
    entity_type: String,
    entity_id: i64,
    due_date: NaiveDate,
    status: String,
    entity_status: String,
}

impl FollowUpSourceRow {
    pub(super) fn into_source(self) -> AppResult<FollowUpSource> {
        let origin = match self.follow_up_id {
            Some(_) => FollowUpOrigin::Explicit,
            None => FollowUpOrigin::Implicit,
        };
        Ok(FollowUpSource {
            dealer_id: DealerId(self.dealer_id),
            dealer_name: self.dealer_name,
            is_important: self.is_important,
            follow_up_id: self.follow_up_id.map(FollowUpId),
            entity_type: self.entity_type.parse::<EntityType>()?,
            entity_id: self.entity_id,
            due_date: self.due_date,
            status: self.status,
            entity_status: self.entity_status,
            origin,
        })
    }
}
