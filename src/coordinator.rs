//! Cache-Aside Coordinator
//!
//! Reads consult the cache first and fill it from the record store on a
//! miss. Writes go to the record store and then delete the cache entry; the
//! new value is never written to the cache directly.
//!
//! Store failures are returned to the caller. Cache failures (errors,
//! timeouts, undecodable payloads) are logged, counted and absorbed: the
//! cache can make a read faster but never makes it fail.
//!
//! Known race: a read that fetched the old row before a concurrent write
//! committed may fill the cache after that write's invalidation. The stale
//! entry lives at most one TTL.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tracing::{info, warn};

use crate::cache::{cache_key, CacheClient, CacheStats, StatsSnapshot, CACHE_TTL};
use crate::config::Config;
use crate::error::{AppError, CacheError, Result, StoreError};
use crate::models::User;
use crate::store::RecordStore;

/// Default timeout of a single cache operation
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

/// Default timeout of a single store operation
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

// == Read Outcome ==
/// Where a successful read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    /// Cache hit, the store was not consulted
    Cache,
    /// Cache miss, fetched from the store and cached
    Store,
    /// The cache lookup failed, fetched from the store without caching
    StoreDegraded,
}

/// Result of a successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    pub user: User,
    pub source: ReadSource,
}

// == Coordinator ==
/// Cache-aside read and write paths over a record store and a cache.
///
/// Holds only shared clients and counters, so one instance serves every
/// concurrent request without locking.
pub struct CacheAside {
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn CacheClient>,
    cache_timeout: Duration,
    store_timeout: Duration,
    stats: Arc<CacheStats>,
}

impl CacheAside {
    // == Constructors ==
    /// Creates a coordinator with the default timeouts.
    pub fn new(store: Arc<dyn RecordStore>, cache: Arc<dyn CacheClient>) -> Self {
        Self {
            store,
            cache,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Creates a coordinator using the timeouts from `config`.
    pub fn from_config(
        store: Arc<dyn RecordStore>,
        cache: Arc<dyn CacheClient>,
        config: &Config,
    ) -> Self {
        Self::new(store, cache).with_timeouts(config.cache_timeout(), config.store_timeout())
    }

    /// Overrides the per-operation timeouts.
    pub fn with_timeouts(mut self, cache_timeout: Duration, store_timeout: Duration) -> Self {
        self.cache_timeout = cache_timeout;
        self.store_timeout = store_timeout;
        self
    }

    /// Lifetime of cached records, and so the staleness bound.
    pub fn ttl(&self) -> Duration {
        CACHE_TTL
    }

    /// Name of the cache backend in use.
    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend()
    }

    /// Returns the current protocol counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // == Read ==
    /// Returns the user with the given id.
    ///
    /// # Errors
    /// - `AppError::NotFound` if the store has no such record; nothing is cached
    /// - `AppError::Store` if the store fails or times out
    pub async fn read(&self, id: i64) -> Result<ReadOutcome> {
        let key = cache_key(id);

        let cache_failed = match self.on_cache(self.cache.get(&key)).await {
            Ok(Some(payload)) => match serde_json::from_str::<User>(&payload) {
                Ok(user) => {
                    info!("Cache hit for user {}", id);
                    self.stats.record_hit();
                    return Ok(ReadOutcome {
                        user,
                        source: ReadSource::Cache,
                    });
                }
                Err(err) => {
                    // Overwritten by the fill below
                    warn!("Discarding undecodable cache entry {}: {}", key, err);
                    self.stats.record_cache_error();
                    false
                }
            },
            Ok(None) => false,
            Err(err) => {
                warn!("Cache lookup failed for user {}, reading from store: {}", id, err);
                self.stats.record_cache_error();
                true
            }
        };

        info!("Cache miss for user {}", id);
        self.stats.record_miss();

        let user = self
            .on_store(self.store.get(id))
            .await?
            .ok_or(AppError::NotFound)?;

        if cache_failed {
            return Ok(ReadOutcome {
                user,
                source: ReadSource::StoreDegraded,
            });
        }

        self.fill(&key, &user).await;
        Ok(ReadOutcome {
            user,
            source: ReadSource::Store,
        })
    }

    // == Write ==
    /// Overwrites `name` and `email` of the user with the given id.
    ///
    /// The cache entry is deleted only after the store reports the row as
    /// modified. A failed deletion is logged; the entry then expires on its
    /// own within one TTL. An update that outlives the store timeout is
    /// reported as `StoreError::Timeout` but keeps running, and its entry is
    /// deleted once it commits.
    ///
    /// # Errors
    /// - `AppError::NotFound` if no row matched; the cache is not touched
    /// - `AppError::Store` if the store fails or times out
    pub async fn write(&self, id: i64, name: &str, email: &str) -> Result<User> {
        // Spawned so a timed-out update is still followed by its invalidation
        let mut update = {
            let store = Arc::clone(&self.store);
            let (name, email) = (name.to_string(), email.to_string());
            tokio::spawn(async move { store.update(id, &name, &email).await })
        };

        let outcome = tokio::time::timeout(self.store_timeout, &mut update).await;
        let affected = match outcome {
            Ok(joined) => settled(joined)?,
            Err(_) => {
                warn!(
                    "Update of user {} timed out after {:?}, invalidating once it settles",
                    id, self.store_timeout
                );
                self.invalidate_when_settled(id, update);
                return Err(StoreError::Timeout(self.store_timeout).into());
            }
        };
        if affected == 0 {
            return Err(AppError::NotFound);
        }

        invalidate(self.cache.as_ref(), &self.stats, self.cache_timeout, id).await;
        Ok(User::new(id, name, email))
    }

    /// Deletes the cache entry after an abandoned update commits.
    fn invalidate_when_settled(
        &self,
        id: i64,
        update: JoinHandle<std::result::Result<usize, StoreError>>,
    ) {
        let cache = Arc::clone(&self.cache);
        let stats = Arc::clone(&self.stats);
        let cache_timeout = self.cache_timeout;
        tokio::spawn(async move {
            match settled(update.await) {
                Ok(0) => {}
                Ok(_) => invalidate(cache.as_ref(), &stats, cache_timeout, id).await,
                Err(err) => warn!("Timed-out update of user {} failed: {}", id, err),
            }
        });
    }

    /// Best-effort write of a freshly fetched record to the cache.
    async fn fill(&self, key: &str, user: &User) {
        let result = match serde_json::to_string(user) {
            Ok(payload) => self.on_cache(self.cache.set(key, payload, CACHE_TTL)).await,
            Err(err) => Err(CacheError::from(err)),
        };

        match result {
            Ok(()) => self.stats.record_fill(),
            Err(err) => {
                warn!("Failed to cache {}: {}", key, err);
                self.stats.record_cache_error();
            }
        }
    }

    async fn on_cache<T>(
        &self,
        op: impl Future<Output = std::result::Result<T, CacheError>>,
    ) -> std::result::Result<T, CacheError> {
        tokio::time::timeout(self.cache_timeout, op)
            .await
            .map_err(|_| CacheError::Timeout(self.cache_timeout))?
    }

    async fn on_store<T>(
        &self,
        op: impl Future<Output = std::result::Result<T, StoreError>>,
    ) -> std::result::Result<T, StoreError> {
        tokio::time::timeout(self.store_timeout, op)
            .await
            .map_err(|_| StoreError::Timeout(self.store_timeout))?
    }
}

/// Flattens the result of a spawned store call.
fn settled<T>(
    joined: std::result::Result<std::result::Result<T, StoreError>, JoinError>,
) -> std::result::Result<T, StoreError> {
    joined.map_err(|e| StoreError::Unavailable(e.to_string()))?
}

/// Deletes the cache entry of `id`. Failures are logged and absorbed; the
/// entry then expires on its own within one TTL.
async fn invalidate(cache: &dyn CacheClient, stats: &CacheStats, timeout: Duration, id: i64) {
    let key = cache_key(id);
    let result = tokio::time::timeout(timeout, cache.del(&key))
        .await
        .map_err(|_| CacheError::Timeout(timeout))
        .and_then(|deleted| deleted);

    match result {
        Ok(()) => {
            info!("Cache invalidated for user {}", id);
            stats.record_invalidation();
        }
        Err(err) => {
            warn!(
                "Cache invalidation failed for user {}, entry may be stale for up to {:?}: {}",
                id, CACHE_TTL, err
            );
            stats.record_cache_error();
        }
    }
}
