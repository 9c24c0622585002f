//! 健康检查模块
//!
//! 提供 /health、/ready 和 /metrics 端点

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use cpq_telemetry::HealthStatus;

use crate::Infrastructure;
use crate::metrics::record_pool_status;

/// 健康检查路由
pub fn health_router(infra: Arc<Infrastructure>) -> Router {
    Router::new()
        .route("/health", get(liveness))
        .route("/ready", get(readiness))
        .route("/metrics", get(metrics))
        .with_state(infra)
}

/// 存活检查，不检查依赖
async fn liveness() -> impl IntoResponse {
    Json(HealthStatus::new())
}

/// 就绪检查
async fn readiness(State(infra): State<Arc<Infrastructure>>) -> impl IntoResponse {
    let mut status = HealthStatus::new();

    match infra.check_postgres().await {
        Ok(()) => status.add_check("postgres", true, None),
        Err(e) => status.add_check("postgres", false, Some(e.to_string())),
    }

    let code = if status.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

async fn metrics(State(infra): State<Arc<Infrastructure>>) -> impl IntoResponse {
    match infra.metrics_handle() {
        Some(handle) => {
            record_pool_status("postgres", infra.postgres_pool_status());
            (StatusCode::OK, handle.render())
        }
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}
