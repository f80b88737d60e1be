//! Record Store Module
//!
//! Durable point lookups and updates of user records, keyed by id.
//! Implementations surface every I/O failure as a `StoreError`; they never
//! retry and never cache.

mod sqlite;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::User;

pub use sqlite::SqliteStore;

/// Durable store of user records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Point lookup by id. `Ok(None)` means no such record.
    async fn get(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// Overwrites `name` and `email` of the record with the given id.
    ///
    /// Returns the number of rows modified, 0 or 1.
    async fn update(&self, id: i64, name: &str, email: &str) -> Result<usize, StoreError>;
}
