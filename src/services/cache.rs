//! Redis caching for computed and saved estimates.
//!
//! - Values are stored as JSON via serde
//! - Every key carries a TTL
//! - Calculated estimates are keyed by a digest of their inputs, so a
//!   catalog change (new revision) never serves a stale price
//! - Connection pooling via ConnectionManager

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Redis cache client with connection pooling.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    default_ttl: Duration,
}

impl RedisCache {
    /// Create a new Redis cache connection.
    pub async fn new(redis_url: &str, default_ttl_seconds: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Failed to create Redis client")?;

        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;

        tracing::info!("Redis cache connected");

        Ok(Self {
            conn,
            default_ttl: Duration::from_secs(default_ttl_seconds),
        })
    }

    /// Get a value from cache. Errors and undecodable entries count as misses.
    #[instrument(skip(self), fields(cache_hit))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone();

        let hit = match conn.get::<_, Option<String>>(key).await {
            Ok(Some(data)) => match serde_json::from_str(&data) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key = key, error = %e, "Failed to deserialize cached value");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!(key = key, error = %e, "Redis get error");
                None
            }
        };

        tracing::Span::current().record("cache_hit", hit.is_some());
        debug!(key = key, hit = hit.is_some(), "Cache lookup");
        hit
    }

    /// Set a value in cache with default TTL.
    #[instrument(skip(self, value))]
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    /// Set a value in cache with custom TTL.
    #[instrument(skip(self, value))]
    pub async fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let mut conn = self.conn.clone();

        let data = serde_json::to_string(value).context("Failed to serialize value for cache")?;

        conn.set_ex::<_, _, ()>(key, data, ttl.as_secs())
            .await
            .context("Failed to set cache value")?;

        debug!(key = key, ttl_secs = ttl.as_secs(), "Cached value");
        Ok(())
    }

    /// Delete a specific key from cache.
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();

        let deleted: i32 = conn.del(key).await.context("Failed to delete cache key")?;

        debug!(key = key, deleted = deleted > 0, "Cache delete");
        Ok(deleted > 0)
    }

    /// Delete all keys matching a pattern (e.g. "estimate:calc:*").
    #[instrument(skip(self))]
    pub async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let mut conn = self.conn.clone();

        // SCAN instead of KEYS so a large keyspace doesn't block Redis
        let keys = scan_all(|cursor| {
            let mut conn = conn.clone();
            async move {
                let page: (u64, Vec<String>) = redis::cmd("SCAN")
                    .cursor_arg(cursor)
                    .arg("MATCH")
                    .arg(pattern)
                    .arg("COUNT")
                    .arg(SCAN_BATCH)
                    .query_async(&mut conn)
                    .await
                    .context("Failed to scan cache keys")?;
                Ok(page)
            }
        })
        .await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: i32 = conn.del(&keys).await.context("Failed to delete cache keys")?;

        debug!(pattern = pattern, deleted = deleted, "Cache pattern delete");
        Ok(deleted as usize)
    }

    /// Check if Redis is healthy.
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Redis health check failed")?;
        Ok(())
    }
}

const SCAN_BATCH: usize = 1000;

/// Follow a SCAN cursor from 0 until the server hands back 0 again.
async fn scan_all<F, Fut>(mut fetch: F) -> Result<Vec<String>>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<(u64, Vec<String>)>>,
{
    let mut keys = Vec::new();
    let mut cursor = 0;
    loop {
        let (next, page) = fetch(cursor).await?;
        keys.extend(page);
        if next == 0 {
            return Ok(keys);
        }
        cursor = next;
    }
}

/// Cache key builders for consistent key formats.
pub mod keys {
    use chrono::NaiveDate;
    use sha2::{Digest, Sha256};
    use uuid::Uuid;

    use crate::estimator::EngineVersion;

    /// Hex SHA-256 of a canonical input serialization
    pub fn digest(bytes: &[u8]) -> String {
        format!("{:x}", Sha256::digest(bytes))
    }

    /// Calculated (unsaved) estimate.
    ///
    /// The schedule date and catalog revision are part of the key because
    /// both change the result for the same input.
    pub fn calculation(
        engine: EngineVersion,
        today: NaiveDate,
        catalog_revision: u64,
        input_digest: &str,
    ) -> String {
        format!(
            "estimate:calc:{}:{}:rev{}:{}",
            engine, today, catalog_revision, input_digest
        )
    }

    /// Pattern matching every calculated estimate
    pub fn calculation_pattern() -> String {
        "estimate:calc:*".to_string()
    }

    /// Saved estimate
    pub fn saved_estimate(id: Uuid) -> String {
        format!("estimate:saved:{}", id)
    }

}
