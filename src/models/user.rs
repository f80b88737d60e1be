//! User record
//!
//! The same serialized form is written to the cache and returned over HTTP,
//! so a cached value is always a verbatim snapshot of a stored row.

use serde::{Deserialize, Serialize};

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Caller-controlled primary key
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl User {
    /// Creates a new User
    pub fn new(id: i64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}
