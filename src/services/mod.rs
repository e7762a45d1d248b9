//! Service layer: shared reference data and the Redis cache.

pub mod cache;
pub mod catalog;

pub use cache::RedisCache;
pub use catalog::CatalogStore;
