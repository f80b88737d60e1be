//! Cache Module
//!
//! The expiring key-value store that sits in front of the record store.
//! Two backends implement [`CacheClient`]: [`RedisCache`] for a shared
//! Redis server and [`MemoryCache`] for a single process.

mod entry;
mod memory;
mod redis_cache;
mod stats;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

// Re-export public types
pub use entry::CacheEntry;
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
pub use stats::{CacheStats, StatsSnapshot};

// == Public Constants ==
/// Lifetime of a cached user record
pub const CACHE_TTL: Duration = Duration::from_secs(60);

/// Prefix of every user cache key
pub const KEY_PREFIX: &str = "user:";

/// Returns the cache key of the user with the given id.
pub fn cache_key(id: i64) -> String {
    format!("{}{}", KEY_PREFIX, id)
}

/// Expiring key-value store consumed by the coordinator.
///
/// Expiry is the backend's job: an entry written with `ttl` must stop being
/// returned by `get` once `ttl` has elapsed.
#[async_trait]
pub trait CacheClient: Send + Sync {
    /// Returns the value stored under `key`, `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key` for `ttl`, replacing any previous value.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_format() {
        assert_eq!(cache_key(1), "user:1");
        assert_eq!(cache_key(42), "user:42");
        assert_eq!(cache_key(-7), "user:-7");
    }

    #[test]
    fn test_cache_ttl_is_sixty_seconds() {
        assert_eq!(CACHE_TTL.as_secs(), 60);
    }
}
