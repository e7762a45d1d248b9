mod api;
mod app;
mod config;
mod db;
mod domain;
mod error;
mod estimator;
mod logging;
mod middleware;
mod routes;
mod services;

use anyhow::Result;

use domain::ReferenceData;
use services::{CatalogStore, RedisCache};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = config::Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        engine = %settings.default_engine,
        "Starting serralheria estimator"
    );

    // Create database pool and bring the schema up to date
    let pool = db::create_pool(&settings).await?;
    db::run_migrations(&pool).await?;

    // Reference data with stored price overrides
    let mut reference = ReferenceData::default();
    reference.tax = settings.tax.clone();
    let catalog = CatalogStore::load(&pool, reference).await?;

    // Redis is optional; without it every request is calculated afresh
    let cache = match RedisCache::new(&settings.redis_url, settings.redis_cache_ttl_seconds).await {
        Ok(cache) => Some(cache),
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable - running without cache");
            None
        }
    };

    // Create application state
    let state = app::AppState::new(pool, settings.clone(), catalog, cache);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
