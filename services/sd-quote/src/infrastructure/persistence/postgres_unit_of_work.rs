//! PostgreSQL Unit of Work 实现
//!
//! 使用 SQLx Transaction 提供事务协调能力。

use std::sync::Arc;

use async_trait::async_trait;
use cpq_adapter_postgres::{IsolationLevel, TransactionOptions, begin_with_options};
use cpq_errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;

use crate::domain::{
    AccountTypeRepository, DealerRepository, FollowUpRepository, NoteRepository,
    OrderRepository, PricingRepository, QuoteItemRepository, QuoteRepository, UnitOfWork,
    UnitOfWorkFactory,
};

use super::tx_repositories::{
    SharedTx, TxAccountTypeRepository, TxDealerRepository, TxFollowUpRepository,
    TxNoteRepository, TxOrderRepository, TxPricingRepository, TxQuoteItemRepository,
    TxQuoteRepository,
};

/// PostgreSQL Unit of Work 工厂
pub struct PostgresUnitOfWorkFactory {
    pool: PgPool,
    options: TransactionOptions,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            // 行锁后的重读依赖读已提交
            options: TransactionOptions::new().with_isolation_level(IsolationLevel::ReadCommitted),
        }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = begin_with_options(&self.pool, &self.options).await?;
        Ok(Box::new(PostgresUnitOfWork::new(tx)))
    }
}

/// PostgreSQL Unit of Work 实现
///
/// 持有一个事务和所有相关的 Repository 实例。
/// 所有 Repository 操作都在同一个事务中执行，未提交即被丢弃时由 SQLx 回滚。
pub struct PostgresUnitOfWork {
    tx: SharedTx,

    account_type_repo: TxAccountTypeRepository,
    dealer_repo: TxDealerRepository,
    pricing_repo: TxPricingRepository,
    quote_repo: TxQuoteRepository,
    quote_item_repo: TxQuoteItemRepository,
    order_repo: TxOrderRepository,
    note_repo: TxNoteRepository,
    follow_up_repo: TxFollowUpRepository,
}

impl PostgresUnitOfWork {
    fn new(tx: Transaction<'static, Postgres>) -> Self {
        let tx: SharedTx = Arc::new(Mutex::new(Some(tx)));

        Self {
            tx: tx.clone(),
            account_type_repo: TxAccountTypeRepository::new(tx.clone()),
            dealer_repo: TxDealerRepository::new(tx.clone()),
            pricing_repo: TxPricingRepository::new(tx.clone()),
            quote_repo: TxQuoteRepository::new(tx.clone()),
            quote_item_repo: TxQuoteItemRepository::new(tx.clone()),
            order_repo: TxOrderRepository::new(tx.clone()),
            note_repo: TxNoteRepository::new(tx.clone()),
            follow_up_repo: TxFollowUpRepository::new(tx),
        }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    fn account_types(&self) -> &dyn AccountTypeRepository {
        &self.account_type_repo
    }

    fn dealers(&self) -> &dyn DealerRepository {
        &self.dealer_repo
    }

    fn pricing(&self) -> &dyn PricingRepository {
        &self.pricing_repo
    }

    fn quotes(&self) -> &dyn QuoteRepository {
        &self.quote_repo
    }

    fn quote_items(&self) -> &dyn QuoteItemRepository {
        &self.quote_item_repo
    }

    fn orders(&self) -> &dyn OrderRepository {
        &self.order_repo
    }

    fn notes(&self) -> &dyn NoteRepository {
        &self.note_repo
    }

    fn follow_ups(&self) -> &dyn FollowUpRepository {
        &self.follow_up_repo
    }

    // ============ Transaction Control ============

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;

        tx.rollback()
            .await
            .map_err(|e| AppError::database(format!("Failed to rollback transaction: {}", e)))?;

        Ok(())
    }
}
