//! Error types for avs-server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict (409) - e.g., reviewer not showing a card
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream failure (502) - AnkiConnect or explanation backend
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Upstream unreachable (503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<avs_common::Error> for ApiError {
    fn from(err: avs_common::Error) -> Self {
        use avs_common::Error;
        match err {
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::ConfigNotFound(msg) => ApiError::NotFound(msg),
            Error::Backend(msg) => ApiError::BadGateway(format!("Explanation backend failed: {}", msg)),
            Error::AnkiConnect { action, message } => {
                ApiError::BadGateway(format!("AnkiConnect error from '{}': {}", action, message))
            }
            err @ (Error::Connectivity(_) | Error::Timeout(_)) => ApiError::ServiceUnavailable(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", msg)
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
