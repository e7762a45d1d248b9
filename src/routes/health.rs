use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::db;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: String,
    pub catalog_revision: u64,
    pub services: ServiceHealth,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub database: String,
    pub redis: String,
}

/// Health check endpoint
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let redis_check = async {
        match &state.cache {
            Some(cache) => Some(cache.health_check().await.is_ok()),
            None => None,
        }
    };
    let (db_ok, redis_ok) = tokio::join!(db::health_check(&state.db), redis_check);

    let redis_status = match redis_ok {
        Some(true) => "ok",
        Some(false) => "error",
        None => "disabled",
    };

    // Only the database is critical; a missing cache just slows things down
    let status = match (db_ok, redis_ok) {
        (false, _) => "unhealthy",
        (true, Some(true)) => "healthy",
        (true, _) => "degraded",
    };

    let status_code = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            engine: state.settings.default_engine.to_string(),
            catalog_revision: state.catalog.revision(),
            services: ServiceHealth {
                database: if db_ok { "ok" } else { "error" }.to_string(),
                redis: redis_status.to_string(),
            },
        }),
    )
}
