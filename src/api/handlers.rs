//! API Handlers
//!
//! Thin HTTP wrappers around the cache-aside coordinator.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};

use crate::coordinator::CacheAside;
use crate::error::{AppError, Result};
use crate::models::{HealthResponse, StatsResponse, UpdateUserRequest, User};

/// Application state shared across all handlers.
///
/// The coordinator owns the long-lived store and cache clients.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<CacheAside>,
}

impl AppState {
    /// Creates a new AppState around the given coordinator.
    pub fn new(coordinator: CacheAside) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
        }
    }
}

/// Extracts the numeric user id. An id that is not an integer names no
/// record, so it is reported as not found.
fn user_id(path: std::result::Result<Path<i64>, PathRejection>) -> Result<i64> {
    path.map(|Path(id)| id).map_err(|_| AppError::NotFound)
}

/// Handler for GET /users/:id
pub async fn get_user_handler(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<User>> {
    let outcome = state.coordinator.read(user_id(path)?).await?;
    Ok(Json(outcome.user))
}

/// Handler for PUT /users/:id
///
/// Responds with the caller-supplied fields paired with the id.
pub async fn update_user_handler(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<User>> {
    let id = user_id(path)?;
    let Json(req) = body.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let user = state.coordinator.write(id, &req.name, &req.email).await?;
    Ok(Json(user))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.coordinator.stats()))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.coordinator.cache_backend()))
}
