//! User Cache - user records served through a cache-aside read path
//!
//! Reads consult an expiring cache before the SQLite store; writes update
//! the store and then invalidate the cached copy.

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use coordinator::{CacheAside, ReadOutcome, ReadSource};
pub use tasks::spawn_cleanup_task;
