//! Error handling module for the documentation hub.
//!
//! Provides the error kinds surfaced by the repository client and the
//! mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const REMOTE_FAILURE: &str = "REMOTE_FAILURE";
    pub const TRANSPORT_FAILURE: &str = "TRANSPORT_FAILURE";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const DECODE_FAILURE: &str = "DECODE_FAILURE";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const SEARCH_ERROR: &str = "SEARCH_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// No credential held, or the remote rejected it
    #[error("{0}")]
    Unauthenticated(String),
    /// Path, revision or thread absent on the remote
    #[error("{0}")]
    NotFound(String),
    /// Stale content hash, or create on an existing path
    #[error("{message}")]
    Conflict { message: String, path: String },
    /// Non-2xx response not covered by a more specific kind
    #[error("remote returned {status}: {message}")]
    RemoteFailure { status: u16, message: String },
    /// Network-level failure, no response received
    #[error("{0}")]
    Transport(String),
    /// The request did not complete within the configured timeout
    #[error("{0}")]
    Timeout(String),
    /// Malformed transport payload
    #[error("{0}")]
    Decode(String),
    /// Rejected input
    #[error("{0}")]
    Validation(String),
    /// Search index error
    #[error("{0}")]
    Search(String),
    /// Invalid configuration
    #[error("{0}")]
    Config(String),
    /// Internal server error
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::RemoteFailure { .. } => StatusCode::BAD_GATEWAY,
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Decode(_) => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Search(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated(_) => codes::UNAUTHENTICATED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Conflict { .. } => codes::CONFLICT,
            AppError::RemoteFailure { .. } => codes::REMOTE_FAILURE,
            AppError::Transport(_) => codes::TRANSPORT_FAILURE,
            AppError::Timeout(_) => codes::TIMEOUT,
            AppError::Decode(_) => codes::DECODE_FAILURE,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Search(_) => codes::SEARCH_ERROR,
            AppError::Config(_) => codes::CONFIG_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Shorthand for the error every repository call returns without a credential.
    pub fn not_authenticated() -> Self {
        AppError::Unauthenticated("No credential configured".to_string())
    }
}

impl From<tantivy::TantivyError> for AppError {
    fn from(err: tantivy::TantivyError) -> Self {
        tracing::error!("Search error: {:?}", err);
        AppError::Search(format!("Search error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::Decode(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            tracing::warn!("Remote request timed out: {}", err);
            return AppError::Timeout(format!("Request timed out: {}", err));
        }
        if err.is_decode() {
            tracing::error!("Malformed remote payload: {:?}", err);
            return AppError::Decode(format!("Malformed response: {}", err));
        }
        tracing::error!("Transport error: {:?}", err);
        AppError::Transport(format!("Transport error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("IO error: {:?}", err);
        AppError::Internal(format!("IO error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
    pub generation: u64,
}

impl ErrorResponse {
    pub fn new(error: &AppError, generation: u64) -> Self {
        let details = match error {
            AppError::Conflict { path, .. } => Some(serde_json::json!({ "path": path })),
            AppError::RemoteFailure { status, .. } => {
                Some(serde_json::json!({ "remoteStatus": status }))
            }
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.to_string(),
                details,
            },
            generation,
        }
    }
}

/// Wrapper type for errors that carry the catalog generation.
#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub generation: u64,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let body = ErrorResponse::new(&self.error, self.generation);
        (status, Json(body)).into_response()
    }
}
