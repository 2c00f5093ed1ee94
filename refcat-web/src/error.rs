//! Error types for refcat-web

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::zotero::ZoteroError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Missing or wrong bearer token (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Upstream reference-manager failure
    #[error(transparent)]
    Upstream(#[from] ZoteroError),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// refcat-common error
    #[error(transparent)]
    Common(#[from] refcat_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad request"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            ApiError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Upstream error"),
            ApiError::Internal(_) | ApiError::Common(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = match self {
            ApiError::Unauthorized => json!({"success": false, "error": error}),
            other => json!({
                "success": false,
                "error": error,
                "message": other.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
