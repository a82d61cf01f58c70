//! Session error types.

use thiserror::Error;

/// Session error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Login rejected by the server (bad email or password)
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Registration rejected by the server (e.g. duplicate email)
    #[error("Registration failed: {0}")]
    Registration(String),

    /// Client-side validation failure, raised before any network I/O
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Token refresh error
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// Session was rejected server-side (revoked, invalid, etc.)
    #[error("Session invalid: {0}")]
    SessionInvalid(String),

    /// No session is present
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] console_storage::StorageError),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
