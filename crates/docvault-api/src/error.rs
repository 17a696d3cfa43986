//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use docvault_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Whether repeating the request unchanged may succeed.
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub retryable: bool,
}

/// Wrapper that renders an [`AppError`] as an HTTP response.
///
/// `AppError` lives in `docvault-core`, so handlers return this type and
/// rely on `?` converting into it.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Result type returned by handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP status and error code for a kind.
pub fn status_for(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ErrorKind::InvalidContent => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_CONTENT"),
        ErrorKind::InvalidState => (StatusCode::CONFLICT, "INVALID_STATE"),
        ErrorKind::ConcurrentModification => (StatusCode::CONFLICT, "CONCURRENT_MODIFICATION"),
        ErrorKind::ContentUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "CONTENT_UNAVAILABLE"),
        ErrorKind::StorageWriteFailed => (StatusCode::BAD_GATEWAY, "STORAGE_WRITE_FAILED"),
        ErrorKind::ServiceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        ErrorKind::Database
        | ErrorKind::Storage
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_code) = status_for(err.kind);

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(kind = %err.kind, error = ?err, "Internal server error");
            "An internal error occurred".to_string()
        } else {
            if status.is_server_error() {
                tracing::warn!(kind = %err.kind, error = %err.message, "Upstream dependency failed");
            }
            err.message.clone()
        };

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message,
            retryable: err.is_retryable(),
        };

        (status, Json(body)).into_response()
    }
}
