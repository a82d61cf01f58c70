//! API error types.

use thiserror::Error;

/// API error type.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No session token is available for an authenticated endpoint
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The server rejected the request's credentials
    #[error("Authentication rejected: HTTP {status}: {body}")]
    Unauthorized { status: u16, body: String },

    /// Any other unsuccessful response from the platform
    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// HTTP transport error (connection, timeout, decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization error for a request body
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// True when this error is an authentication rejection.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}
