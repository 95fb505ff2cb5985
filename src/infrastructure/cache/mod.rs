//! Key-value cache backends behind the [`CacheService`] abstraction.
//!
//! - [`RedisCache`] - Cluster-shared Redis cache
//! - [`MemoryCache`] - Process-local cache with per-entry expiry
//! - [`NullCache`] - Always misses; used when caching is disabled

mod memory_cache;
mod null_cache;
mod redis_cache;
mod service;

pub use memory_cache::MemoryCache;
pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheResult, CacheService};
