//! Error types for the user service
//!
//! Store failures propagate to the caller, cache failures never do. The
//! HTTP mapping lives here so handlers can simply return `Result<T>`.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == Store Error ==
/// Failure of the durable record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The SQLite driver reported an error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The store did not answer within the configured timeout
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The connection could not be used (poisoned lock, aborted worker)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

// == Cache Error ==
/// Failure of the expiring cache store.
///
/// Every variant is treated as "cache unavailable" by the coordinator and is
/// absorbed there; none of them reach an HTTP client.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The Redis client reported an error (connectivity, protocol)
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The cache did not answer within the configured timeout
    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    /// A cached payload could not be encoded or decoded
    #[error("Cache payload error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == App Error ==
/// Error returned by the coordinator and the HTTP handlers.
#[derive(Error, Debug)]
pub enum AppError {
    /// No record exists for the requested id
    #[error("User not found")]
    NotFound,

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Durable store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Store(err) => {
                error!("Store error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the user service.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let response = AppError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, r#"{"error":"User not found"}"#);
    }

    #[tokio::test]
    async fn test_store_error_is_not_leaked() {
        let err = AppError::from(StoreError::Unavailable("lock poisoned".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_string(response).await;
        assert_eq!(body, r#"{"error":"Internal Server Error"}"#);
        assert!(!body.contains("poisoned"));
    }

    #[tokio::test]
    async fn test_invalid_request_response() {
        let response = AppError::InvalidRequest("Name cannot be empty".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("Name cannot be empty"));
    }
}
