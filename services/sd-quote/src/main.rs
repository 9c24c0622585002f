//! sd-quote 服务入口

use std::sync::Arc;

use sd_quote::api::{AppState, build_router};
use sd_quote::infrastructure::migrations;
use sd_quote::infrastructure::persistence::PostgresUnitOfWorkFactory;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    cpq_bootstrap::run("config", &migrations(), |infra| {
        let uow_factory = Arc::new(PostgresUnitOfWorkFactory::new(infra.postgres_pool()));
        build_router(AppState::new(uow_factory))
    })
    .await
}
