use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use catalog_core::config::{AppConfig, ConfigError};
use catalog_core::{ProductQueryService, ProductStore};
use catalog_db::{connect_with_settings, migrations, DbPool, SqlProductRepository};
use thiserror::Error;
use tracing::{debug, info};

use crate::health;
use crate::products::{ProductRoutes, PRODUCT_BY_ID_PATTERN, PRODUCT_SEARCH_PATTERN};
use crate::router::{PathRouter, RouteError};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub router: PathRouter,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Routes(#[from] RouteError),
}

/// Assembles the application from an already loaded config. The config is validated
/// again so programmatically built configs get the same checks as loaded ones.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");
    config.validate()?;

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let store: Arc<dyn ProductStore> = Arc::new(SqlProductRepository::new(db_pool.clone()));
    let service = Arc::new(ProductQueryService::new(store));
    let router = routes(service, db_pool.clone(), config.server.request_timeout())?;

    for entry in router.registered_routes() {
        debug!(
            event_name = "system.bootstrap.route_registered",
            method = %entry.method(),
            pattern = entry.pattern(),
            "route registered"
        );
    }

    Ok(Application { config, db_pool, router })
}

/// Builds the route table. Dispatch tries entries in this order.
pub fn routes(
    service: Arc<ProductQueryService>,
    db_pool: DbPool,
    request_timeout: Duration,
) -> Result<PathRouter, RouteError> {
    let products = ProductRoutes::new(service, request_timeout);

    Ok(PathRouter::builder()
        .route(Method::GET, health::HEALTH_PATTERN, health::handler(db_pool))?
        .route(Method::GET, PRODUCT_SEARCH_PATTERN, products.search_handler())?
        .route(Method::GET, PRODUCT_BY_ID_PATTERN, products.by_id_handler())?
        .build())
}
