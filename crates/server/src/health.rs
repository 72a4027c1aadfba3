use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use catalog_db::{ping, DbPool};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::router::Handler;

pub const HEALTH_PATTERN: &str = "/health";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub checked_at: String,
}

pub fn handler(db_pool: DbPool) -> impl Handler {
    move |_request: Request| {
        let db_pool = db_pool.clone();
        async move { health(&db_pool).await.into_response() }
    }
}

pub async fn health(db_pool: &DbPool) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(db_pool).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "catalog-server runtime initialized".to_string(),
        },
        database,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match ping(pool).await {
        Ok(()) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            warn!(event_name = "system.health.database_degraded", error = %error, "health probe failed");
            HealthCheck { status: "degraded", detail: "database query failed".to_string() }
        }
    }
}
