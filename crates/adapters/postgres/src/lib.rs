//! cpq-adapter-postgres - PostgreSQL 适配器

mod claim;
mod connection;
mod error_mapper;
mod migration;
mod transaction;

pub use claim::*;
pub use connection::*;
pub use error_mapper::*;
pub use migration::*;
pub use transaction::*;
