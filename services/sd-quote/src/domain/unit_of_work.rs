//! Unit of Work 模式
//!
//! 提供跨多个 Repository 的事务协调能力，确保操作的原子性。

use async_trait::async_trait;
use cpq_errors::AppResult;

use crate::domain::repositories::{
    AccountTypeRepository, DealerRepository, FollowUpRepository, NoteRepository,
    OrderRepository, PricingRepository, QuoteItemRepository, QuoteRepository,
};

/// Unit of Work trait
///
/// 协调多个 Repository 在同一事务中的操作。未提交就被丢弃的 UnitOfWork 会回滚。
///
/// # 使用示例
///
/// ```ignore
/// let uow = uow_factory.begin().await?;
///
/// let quote_id = uow.quotes().insert(&tenant_id, &new_quote).await?;
/// uow.quote_items().insert_batch(&tenant_id, quote_id, &items).await?;
///
/// uow.commit().await?;
/// ```
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn account_types(&self) -> &dyn AccountTypeRepository;

    fn dealers(&self) -> &dyn DealerRepository;

    fn pricing(&self) -> &dyn PricingRepository;

    fn quotes(&self) -> &dyn QuoteRepository;

    fn quote_items(&self) -> &dyn QuoteItemRepository;

    fn orders(&self) -> &dyn OrderRepository;

    fn notes(&self) -> &dyn NoteRepository;

    fn follow_ups(&self) -> &dyn FollowUpRepository;

    /// 提交事务
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Unit of Work 工厂 trait
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// 开始新的事务（READ COMMITTED）
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}
