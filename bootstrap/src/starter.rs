//! 服务启动器
//!
//! 提供统一的 HTTP 服务启动模式

use std::sync::Arc;

use axum::{Router, middleware};
use cpq_adapter_postgres::Migration;
use cpq_config::AppConfig;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::health::health_router;
use crate::infrastructure::Infrastructure;
use crate::metrics::track_http_metrics;
use crate::runtime::{init_runtime, shutdown_signal};

/// 运行 HTTP 服务
///
/// 1. 加载配置并初始化日志
/// 2. 创建连接池（带重试）并按需应用迁移
/// 3. 调用 `router_builder` 构建业务路由，合并健康检查路由
/// 4. 启动服务器并处理 graceful shutdown
///
/// # 示例
///
/// ```ignore
/// use cpq_bootstrap::run;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     run("config", &migrations(), |infra| build_router(infra.postgres_pool())).await
/// }
/// ```
pub async fn run<F>(
    config_dir: &str,
    migrations: &[Migration],
    router_builder: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&Infrastructure) -> Router,
{
    let config = AppConfig::load(config_dir)?;
    init_runtime(&config);

    info!("Starting {} service", config.app_name);

    let infra = Infrastructure::from_config(config).await?;
    infra.run_migrations(migrations).await?;

    let request_timeout = infra.config().server.request_timeout();
    let addr = infra.config().server.bind_address();

    let app = router_builder(&infra);
    let infra = Arc::new(infra);
    let app = app
        .merge(health_router(infra.clone()))
        .layer(middleware::from_fn(track_http_metrics))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "HTTP server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    infra.postgres_pool().close().await;
    info!("Service stopped");

    Ok(())
}
