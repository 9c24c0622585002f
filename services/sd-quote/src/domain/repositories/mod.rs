//! 仓储接口模块
//!
//! 所有仓储都通过 [`UnitOfWork`](crate::domain::UnitOfWork) 获取，共享同一个事务。

mod account_type_repository;
mod dealer_repository;
mod follow_up_repository;
mod note_repository;
mod order_repository;
mod pricing_repository;
mod quote_item_repository;
mod quote_repository;

pub use account_type_repository::AccountTypeRepository;
pub use dealer_repository::DealerRepository;
pub use follow_up_repository::FollowUpRepository;
pub use note_repository::NoteRepository;
pub use order_repository::OrderRepository;
pub use pricing_repository::PricingRepository;
pub use quote_item_repository::QuoteItemRepository;
pub use quote_repository::QuoteRepository;
