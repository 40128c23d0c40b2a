//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: message must not be empty",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request            |
/// | 2000–2999 | Not Found       | 404 Not Found              |
/// | 3000–3999 | Server/Backend  | 500 / 503                  |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed before any side effect.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unsupported severity level string.
    #[error("invalid error level: {0}")]
    InvalidLevel(String),

    /// No stored error with the given ID.
    #[error("error not found: {0}")]
    ErrorNotFound(uuid::Uuid),

    /// Durable store unreachable or rejected the operation.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Cache/queue layer unreachable or rejected the operation.
    ///
    /// Rarely surfaces to a client: ingestion falls back to a synchronous
    /// store write, reads degrade to the store, and invalidation failures
    /// are logged and swallowed.
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidLevel(_) => 1002,
            Self::ErrorNotFound(_) => 2001,
            Self::StorageUnavailable(_) => 3001,
            Self::CacheUnavailable(_) => 3002,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidLevel(_) => StatusCode::BAD_REQUEST,
            Self::ErrorNotFound(_) => StatusCode::NOT_FOUND,
            Self::StorageUnavailable(_) | Self::CacheUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
