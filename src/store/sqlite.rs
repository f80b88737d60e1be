//! SQLite Record Store
//!
//! A single long-lived connection shared by every request. Blocking driver
//! calls run on the blocking thread pool so request tasks only suspend.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::RecordStore;
use crate::error::StoreError;
use crate::models::User;

const CREATE_USERS_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT, email TEXT)";

// == SQLite Store ==
/// `RecordStore` backed by a SQLite database file.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    // == Constructors ==
    /// Opens (or creates) the database at `path` and bootstraps the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database, mostly useful for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(CREATE_USERS_TABLE)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // == Insert ==
    /// Inserts a record with its caller-supplied id.
    pub async fn insert(&self, user: User) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO users (id, name, email) VALUES (?1, ?2, ?3)",
                params![user.id, user.name, user.email],
            )
            .map(|_| ())
        })
        .await
    }

    // == Count ==
    /// Returns the number of stored records.
    pub async fn count(&self) -> Result<i64, StoreError> {
        self.with_conn(|conn| conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0)))
            .await
    }

    // == Seed ==
    /// Inserts the sample users when the table is empty.
    ///
    /// Returns the number of records inserted.
    pub async fn seed_sample_data(&self) -> Result<usize, StoreError> {
        if self.count().await? > 0 {
            debug!("Users table already populated, skipping seed");
            return Ok(0);
        }

        let samples = [
            User::new(1, "Alice", "alice@example.com"),
            User::new(2, "Bob", "bob@example.com"),
        ];
        let seeded = samples.len();
        for user in samples {
            self.insert(user).await?;
        }

        info!("Seeded {} sample users", seeded);
        Ok(seeded)
    }

    /// Runs `f` against the shared connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
            f(&*guard).map_err(StoreError::from)
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get(&self, id: i64) -> Result<Option<User>, StoreError> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, name, email FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
    }

    async fn update(&self, id: i64, name: &str, email: &str) -> Result<usize, StoreError> {
        let name = name.to_string();
        let email = email.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE users SET name = ?1, email = ?2 WHERE id = ?3",
                params![name, email, id],
            )
        })
        .await
    }
}
