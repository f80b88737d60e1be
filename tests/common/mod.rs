//! Shared test doubles for the integration tests
//!
//! `FakeStore` and `FlakyCache` count their calls, can inject failures and
//! append every operation to a shared journal so tests can check ordering.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use user_cache::cache::{CacheClient, MemoryCache};
use user_cache::error::{CacheError, StoreError};
use user_cache::models::User;
use user_cache::store::RecordStore;

/// Ordered log of store and cache operations.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn alice() -> User {
    User::new(1, "Alice", "alice@example.com")
}

pub fn bob() -> User {
    User::new(2, "Bob", "bob@example.com")
}

// == Fake Store ==
/// In-memory `RecordStore` with call counters and failure injection.
pub struct FakeStore {
    rows: Mutex<HashMap<i64, User>>,
    gets: AtomicUsize,
    updates: AtomicUsize,
    failing: AtomicBool,
    hang: AtomicBool,
    update_delay: Mutex<Option<Duration>>,
    gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
    journal: Journal,
}

impl FakeStore {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self::with_journal(users, journal())
    }

    pub fn with_journal(users: impl IntoIterator<Item = User>, journal: Journal) -> Self {
        Self {
            rows: Mutex::new(users.into_iter().map(|u| (u.id, u)).collect()),
            gets: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            hang: AtomicBool::new(false),
            update_delay: Mutex::new(None),
            gate: Mutex::new(None),
            journal,
        }
    }

    pub fn row(&self, id: i64) -> Option<User> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes every operation never complete.
    pub fn set_hanging(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    /// Makes `update` wait for `delay` before applying the change.
    pub fn delay_updates(&self, delay: Duration) {
        *self.update_delay.lock().unwrap() = Some(delay);
    }

    /// Makes the next `get` read its row, signal `reached`, then wait for
    /// `release` before returning that row.
    pub fn gate_next_get(&self) -> (Arc<Notify>, Arc<Notify>) {
        let reached = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some((reached.clone(), release.clone()));
        (reached, release)
    }

    async fn stall(&self) {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }

    fn injected_failure(&self) -> Option<StoreError> {
        self.failing
            .load(Ordering::SeqCst)
            .then(|| StoreError::Unavailable("injected store failure".to_string()))
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn get(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().unwrap().push(format!("store.get {}", id));
        self.stall().await;
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }

        let row = self.row(id);
        let gate = self.gate.lock().unwrap().take();
        if let Some((reached, release)) = gate {
            reached.notify_one();
            release.notified().await;
        }
        Ok(row)
    }

    async fn update(&self, id: i64, name: &str, email: &str) -> Result<usize, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        let delay = *self.update_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }

        let mut rows = self.rows.lock().unwrap();
        let affected = match rows.get_mut(&id) {
            Some(user) => {
                user.name = name.to_string();
                user.email = email.to_string();
                1
            }
            None => 0,
        };
        self.journal
            .lock()
            .unwrap()
            .push(format!("store.update {} affected={}", id, affected));
        Ok(affected)
    }
}

// == Flaky Cache ==
/// `CacheClient` over a `MemoryCache` with call counters, injectable
/// failures and an optional hang to exercise timeouts.
pub struct FlakyCache {
    pub inner: MemoryCache,
    gets: AtomicUsize,
    sets: AtomicUsize,
    dels: AtomicUsize,
    fail_get: AtomicBool,
    fail_set: AtomicBool,
    fail_del: AtomicBool,
    hang: AtomicBool,
    journal: Journal,
}

impl FlakyCache {
    pub fn new() -> Self {
        Self::with_journal(journal())
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            inner: MemoryCache::new(),
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
            dels: AtomicUsize::new(0),
            fail_get: AtomicBool::new(false),
            fail_set: AtomicBool::new(false),
            fail_del: AtomicBool::new(false),
            hang: AtomicBool::new(false),
            journal,
        }
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn del_calls(&self) -> usize {
        self.dels.load(Ordering::SeqCst)
    }

    /// Makes every operation fail as if the server were unreachable.
    pub fn set_down(&self, down: bool) {
        self.fail_get.store(down, Ordering::SeqCst);
        self.fail_set.store(down, Ordering::SeqCst);
        self.fail_del.store(down, Ordering::SeqCst);
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    pub fn fail_dels(&self, fail: bool) {
        self.fail_del.store(fail, Ordering::SeqCst);
    }

    /// Makes every operation never complete.
    pub fn set_hanging(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    async fn fault(&self, flag: &AtomicBool) -> Result<(), CacheError> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if flag.load(Ordering::SeqCst) {
            return Err(CacheError::from(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheClient for FlakyCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().unwrap().push(format!("cache.get {}", key));
        self.fault(&self.fail_get).await?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().unwrap().push(format!("cache.set {}", key));
        self.fault(&self.fail_set).await?;
        self.inner.set(key, value, ttl).await
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.dels.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().unwrap().push(format!("cache.del {}", key));
        self.fault(&self.fail_del).await?;
        self.inner.del(key).await
    }

    fn backend(&self) -> &'static str {
        "flaky"
    }
}
