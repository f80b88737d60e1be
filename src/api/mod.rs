//! API Module
//!
//! HTTP handlers and routing for the user service REST API.
//!
//! # Endpoints
//! - `GET /users/:id` - Read a user through the cache
//! - `PUT /users/:id` - Update a user and invalidate its cache entry
//! - `GET /stats` - Cache-aside counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
