//! Error types for swim-coach HTTP handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::progress::ProgressError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or expired session (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Conflict (409): already reviewed, level out of sequence
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store still contended after retrying (503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// swim-common error
    #[error("Common error: {0}")]
    Common(#[from] swim_common::Error),
}

impl From<ProgressError> for ApiError {
    fn from(err: ProgressError) -> Self {
        let message = err.to_string();
        match err {
            ProgressError::NotFound { .. } => ApiError::NotFound(message),
            ProgressError::AlreadyReviewed(_) | ProgressError::InvalidLevelSequence { .. } => {
                ApiError::Conflict(message)
            }
            ProgressError::InvalidInput(_) => ApiError::BadRequest(message),
            ProgressError::StoreUnavailable(_) => ApiError::ServiceUnavailable(message),
            ProgressError::Internal(_) => ApiError::Internal(message),
        }
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
            ApiError::Internal(_) | ApiError::Other(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            ApiError::Common(swim_common::Error::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Common(swim_common::Error::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        let message = match &self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::Internal(msg) => msg.clone(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, "{}", message);
        }

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
