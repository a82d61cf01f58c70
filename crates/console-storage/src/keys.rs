//! Storage key constants.

/// Storage keys used by the console
pub struct StorageKeys;

impl StorageKeys {
    /// The persisted session record (JSON)
    pub const SESSION: &'static str = "session";
}
