//! Data models for the user service
//!
//! This module defines the user record shared by the store and the cache,
//! plus the DTOs used for HTTP request and response bodies.

pub mod requests;
pub mod responses;
pub mod user;

// Re-export commonly used types
pub use requests::UpdateUserRequest;
pub use responses::{ErrorResponse, HealthResponse, StatsResponse};
pub use user::User;
