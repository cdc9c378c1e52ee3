//! Error types for tfb-ui
//!
//! Every API failure renders the `{"success": false, "error": "..."}`
//! JSON shape the auto-save front end expects.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Access to a resource outside the caller's team (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// tfb-common error
    #[error("{0}")]
    Common(#[from] tfb_common::Error),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Database(ref err) => {
                tracing::error!("Database error: {}", err);
                let msg = if err.to_string().contains("database is locked") {
                    // Single-instance tool; a lock means another copy is running.
                    "Database is locked - make sure only one instance of the tool is running"
                        .to_string()
                } else {
                    "Storage failure - try restarting the tool".to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::Io(ref err) => {
                tracing::error!("IO error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage failure - try restarting the tool".to_string(),
                )
            }
            ApiError::Common(ref err) => match err {
                tfb_common::Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
                tfb_common::Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                other => {
                    tracing::error!("Internal error: {}", other);
                    (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
                }
            },
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::Other(ref err) => {
                tracing::error!("Internal error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
