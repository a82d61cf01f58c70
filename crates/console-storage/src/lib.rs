//! Durable session storage for the MAAS console.
//!
//! Tokens must survive process restarts, so the session record is persisted
//! through a pluggable key-value backend:
//! - [`FileStorage`]: JSON map persisted under the console's base directory
//! - any [`StorageBackend`] implementation (tests use an in-memory map)

mod file;
mod keys;
mod session;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use session::{OrganizationMembership, SessionRecord, SessionStore, UserProfile};
pub use traits::StorageBackend;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage error
    #[error("Backend storage error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
