use axum::{http::HeaderValue, Router};
use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Settings;
use crate::middleware::{request_id_layer, RequestIdSpan};
use crate::routes;
use crate::services::{CatalogStore, RedisCache};

/// Shared application state
pub struct AppState {
    pub db: PgPool,
    pub settings: Settings,
    pub catalog: CatalogStore,
    /// `None` when Redis was unreachable at startup; caching is skipped
    pub cache: Option<RedisCache>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        settings: Settings,
        catalog: CatalogStore,
        cache: Option<RedisCache>,
    ) -> Arc<Self> {
        Arc::new(Self {
            db,
            settings,
            catalog,
            cache,
        })
    }

    /// Current date at the business location
    pub fn today(&self) -> NaiveDate {
        let offset = Duration::hours(i64::from(self.settings.business_utc_offset_hours));
        (Utc::now() + offset).date_naive()
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(&state.settings);

    // Build trace layer (DEBUG spans keep INFO-level overhead low)
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(RequestIdSpan)
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    // Request ID layers
    let (set_request_id, propagate_request_id) = request_id_layer();

    let body_limit = RequestBodyLimitLayer::new(state.settings.max_body_bytes);

    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(body_limit)
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        .with_state(state)
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // Longer preflight cache in development to cut down OPTIONS requests
    let max_age = if settings.env.is_dev() {
        std::time::Duration::from_secs(86400)
    } else {
        std::time::Duration::from_secs(3600)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static("x-request-id"),
        ]))
        .max_age(max_age)
}
