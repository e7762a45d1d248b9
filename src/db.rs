//! Database connection pool management

use anyhow::{Context, Result};
use backoff::ExponentialBackoffBuilder;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::str::FromStr;
use std::time::Duration;

use crate::config::Settings;

/// Give up on the initial connection after this long
const CONNECT_RETRY_WINDOW: Duration = Duration::from_secs(60);

fn pool_options(settings: &Settings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
}

/// Create a PostgreSQL connection pool, retrying while the database comes up
pub async fn create_pool(settings: &Settings) -> Result<PgPool> {
    let connect_options = PgConnectOptions::from_str(&settings.database_url)
        .context("Invalid DATABASE_URL")?
        .application_name("serralheria-estimator");
    let options = pool_options(settings);

    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(500))
        .with_max_elapsed_time(Some(CONNECT_RETRY_WINDOW))
        .build();

    let pool = backoff::future::retry_notify(
        policy,
        || {
            let options = options.clone();
            let connect_options = connect_options.clone();
            async move {
                options
                    .connect_with(connect_options)
                    .await
                    .map_err(backoff::Error::transient)
            }
        },
        |err: sqlx::Error, wait: Duration| {
            tracing::warn!(error = %err, retry_in_ms = wait.as_millis() as u64, "PostgreSQL not reachable yet");
        },
    )
    .await
    .context("Failed to connect to PostgreSQL")?;

    tracing::info!(
        max_connections = settings.database_max_connections,
        "Database connection pool established"
    );

    Ok(pool)
}

/// Apply pending schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Lightweight health check for database connectivity
pub async fn health_check(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
}
