//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Path of the SQLite database file
    pub database_path: String,
    /// Redis connection URL, the in-process cache is used when unset
    pub redis_url: Option<String>,
    /// Timeout in milliseconds for a single cache operation
    pub cache_timeout_ms: u64,
    /// Timeout in milliseconds for a single store operation
    pub store_timeout_ms: u64,
    /// Purge interval in seconds for the in-process cache
    pub cleanup_interval: u64,
    /// Insert the sample users into an empty table at startup
    pub seed_sample_data: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 4000)
    /// - `DATABASE_PATH` - SQLite file (default: database.sqlite)
    /// - `REDIS_URL` - Redis URL (default: unset, in-process cache)
    /// - `CACHE_TIMEOUT_MS` - Cache operation timeout (default: 250)
    /// - `STORE_TIMEOUT_MS` - Store operation timeout (default: 2000)
    /// - `CLEANUP_INTERVAL` - In-process cache purge frequency in seconds (default: 1)
    /// - `SEED_SAMPLE_DATA` - Seed sample users (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            database_path: env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            cache_timeout_ms: parse_var("CACHE_TIMEOUT_MS").unwrap_or(defaults.cache_timeout_ms),
            store_timeout_ms: parse_var("STORE_TIMEOUT_MS").unwrap_or(defaults.store_timeout_ms),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            seed_sample_data: parse_var("SEED_SAMPLE_DATA").unwrap_or(defaults.seed_sample_data),
        }
    }

    /// Per-operation cache timeout.
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    /// Per-operation store timeout.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 4000,
            database_path: "database.sqlite".to_string(),
            redis_url: None,
            cache_timeout_ms: 250,
            store_timeout_ms: 2000,
            cleanup_interval: 1,
            seed_sample_data: true,
        }
    }
}
