//! 基础设施层
//!
//! 包含持久化实现和数据库迁移

pub mod persistence;

use cpq_adapter_postgres::Migration;

/// 服务启动时执行的迁移
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(
        1,
        "quote_engine",
        include_str!("../../migrations/0001_quote_engine.sql"),
    )]
}
