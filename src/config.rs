use anyhow::{bail, Context, Result};
use std::env;

use crate::domain::TaxRegime;
use crate::estimator::EngineVersion;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Redis
    pub redis_url: String,
    pub redis_cache_ttl_seconds: u64,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // HTTP
    pub max_body_bytes: usize,

    // Estimator
    pub default_engine: EngineVersion,
    /// Offset from UTC used to decide what "today" is for scheduling
    pub business_utc_offset_hours: i32,
    pub tax: TaxRegime,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = Environment::from_str(&var("ENV").unwrap_or_else(|| "dev".to_string()));
        let server_addr = var("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());

        // Database
        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_connections = var("DATABASE_MAX_CONNECTIONS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        // Redis
        let redis_url = var("REDIS_URL").unwrap_or_else(|| "redis://redis:6379/0".to_string());
        let redis_cache_ttl_seconds = var("REDIS_CACHE_TTL_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600); // 1 hour default

        // CORS
        let cors_allow_origins = var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_body_bytes = var("MAX_BODY_BYTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(64 * 1024);

        // Estimator
        let default_engine = match var("ESTIMATOR_ENGINE") {
            Some(raw) => match EngineVersion::from_str(&raw) {
                Some(engine) => engine,
                None => bail!("ESTIMATOR_ENGINE must be v1 or v2, got {:?}", raw),
            },
            None => EngineVersion::default(),
        };
        let business_utc_offset_hours = var("BUSINESS_UTC_OFFSET_HOURS")
            .and_then(|s| s.parse().ok())
            .filter(|h: &i32| (-12..=14).contains(h))
            .unwrap_or(-3); // America/Sao_Paulo

        let defaults = TaxRegime::default();
        let tax = TaxRegime {
            regime: var("TAX_REGIME").unwrap_or(defaults.regime),
            rate_percent: var("TAX_RATE_PERCENT")
                .and_then(|s| s.parse().ok())
                .filter(|r: &f64| r.is_finite() && *r >= 0.0)
                .unwrap_or(defaults.rate_percent),
        };

        Ok(Settings {
            env,
            server_addr,
            database_url,
            database_max_connections,
            redis_url,
            redis_cache_ttl_seconds,
            cors_allow_origins,
            max_body_bytes,
            default_engine,
            business_utc_offset_hours,
            tax,
        })
    }
}
