//! Request DTOs for the user service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Maximum accepted length of a name or email, in bytes
pub const MAX_FIELD_LENGTH: usize = 256;

/// Request body for the update operation (PUT /users/:id)
///
/// # Fields
/// - `name`: The new name
/// - `email`: The new email
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
}

impl UpdateUserRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.name.is_empty() {
            return Some("Name cannot be empty".to_string());
        }
        if self.email.is_empty() {
            return Some("Email cannot be empty".to_string());
        }
        if self.name.len() > MAX_FIELD_LENGTH || self.email.len() > MAX_FIELD_LENGTH {
            return Some(format!(
                "Fields cannot exceed {} characters",
                MAX_FIELD_LENGTH
            ));
        }
        None
    }
}
