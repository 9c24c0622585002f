//! cpq-bootstrap - 统一服务启动骨架
//!
//! 配置加载、日志、连接池、迁移、健康检查和 HTTP 服务的启动逻辑

mod health;
mod infrastructure;
mod metrics;
mod runtime;
mod starter;

pub use health::*;
pub use infrastructure::*;
pub use metrics::*;
pub use runtime::*;
pub use starter::*;
