//! 基础设施资源管理

use cpq_adapter_postgres::{Migration, MigrationManager, PostgresConfig, check_connection, create_pool};
use cpq_common::retry::{RetryConfig, is_retryable_error, with_retry};
use cpq_config::AppConfig;
use cpq_errors::{AppError, AppResult};
use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::{info, warn};

/// 连接池状态
#[derive(Debug, Clone, Copy)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: u32,
    pub active: u32,
}

/// 基础设施资源容器
pub struct Infrastructure {
    config: AppConfig,
    postgres_pool: PgPool,
    metrics_handle: Option<PrometheusHandle>,
}

impl Infrastructure {
    /// 从配置创建基础设施资源（带重试）
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        let retry_config = RetryConfig::default();

        let pg_config = PostgresConfig::new(config.database.url.expose_secret())
            .with_max_connections(config.database.max_connections)
            .with_connect_timeout(config.database.connect_timeout());
        let postgres_pool = with_retry(
            &retry_config,
            "PostgreSQL connection",
            |e: &AppError| is_retryable_error(&e.to_string()),
            || {
                let cfg = pg_config.clone();
                async move { create_pool(&cfg).await }
            },
        )
        .await?;
        info!(
            max_connections = config.database.max_connections,
            "PostgreSQL connection pool created"
        );

        let metrics_handle = if config.telemetry.metrics_enabled {
            match cpq_telemetry::init_metrics() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!(error = %e, "Failed to install Prometheus recorder, metrics disabled");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            config,
            postgres_pool,
            metrics_handle,
        })
    }

    /// 应用嵌入的迁移脚本
    pub async fn run_migrations(&self, migrations: &[Migration]) -> AppResult<()> {
        if !self.config.migrations.run_on_startup {
            info!("Migrations on startup disabled, skipping");
            return Ok(());
        }

        let result = MigrationManager::new(self.postgres_pool.clone())
            .migrate(migrations)
            .await?;

        if let Some(first) = result.errors.first() {
            return Err(AppError::internal(format!(
                "Migration {} ({}) failed: {}",
                first.version, first.name, first.error
            )));
        }

        info!(
            applied = result.applied_count(),
            skipped = result.skipped.len(),
            "Migrations complete"
        );
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn postgres_pool(&self) -> PgPool {
        self.postgres_pool.clone()
    }

    pub fn metrics_handle(&self) -> Option<&PrometheusHandle> {
        self.metrics_handle.as_ref()
    }

    pub fn postgres_pool_status(&self) -> PoolStatus {
        let pool = &self.postgres_pool;
        let idle = pool.num_idle() as u32;
        PoolStatus {
            size: pool.size(),
            idle,
            active: pool.size().saturating_sub(idle),
        }
    }

    /// 检查 PostgreSQL 连接
    pub async fn check_postgres(&self) -> AppResult<()> {
        check_connection(&self.postgres_pool).await
    }
}
