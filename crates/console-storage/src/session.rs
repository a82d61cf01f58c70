//! High-level API for the persisted session record.

use crate::{StorageBackend, StorageError, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};

/// Organization membership on a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMembership {
    /// Organization UUID
    pub id: String,
    /// Organization display name
    pub name: String,
    /// The user's role within the organization
    pub role: String,
}

/// Authenticated user profile as returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User UUID
    pub id: String,
    /// Login email
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Whether the user has platform admin rights
    #[serde(default)]
    pub is_admin: bool,
    /// Organizations the user belongs to
    #[serde(default)]
    pub organizations: Vec<OrganizationMembership>,
}

/// Everything about a session that must survive a restart.
///
/// Transient flags (loading, last error) live on the session manager and are
/// never written here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Cached profile of the signed-in user
    pub user: Option<UserProfile>,
    /// Bearer credential for API calls; opaque to the client
    pub access_token: Option<String>,
    /// Credential used solely to mint new access tokens
    pub refresh_token: Option<String>,
    /// True only after a successful login, bootstrap validation, or refresh
    #[serde(default)]
    pub is_authenticated: bool,
}

impl SessionRecord {
    /// True when the record holds no session data at all.
    pub fn is_empty(&self) -> bool {
        self.user.is_none()
            && self.access_token.is_none()
            && self.refresh_token.is_none()
            && !self.is_authenticated
    }
}

/// Reads and writes the session record through a storage backend.
pub struct SessionStore {
    storage: Box<dyn StorageBackend>,
}

impl SessionStore {
    /// Create a new session store with the given storage backend
    pub fn new(storage: Box<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Load the persisted record, or an empty one when nothing is stored.
    pub fn load(&self) -> StorageResult<SessionRecord> {
        match self.storage.get(StorageKeys::SESSION)? {
            Some(json) => {
                serde_json::from_str(&json).map_err(|e| StorageError::Encoding(e.to_string()))
            }
            None => Ok(SessionRecord::default()),
        }
    }

    /// Persist the record, replacing whatever was stored before.
    pub fn save(&self, record: &SessionRecord) -> StorageResult<()> {
        let json =
            serde_json::to_string(record).map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.storage.set(StorageKeys::SESSION, &json)
    }

    /// Remove the persisted record. Clearing an already-empty store is fine.
    pub fn clear(&self) -> StorageResult<()> {
        let _ = self.storage.delete(StorageKeys::SESSION);
        Ok(())
    }

    /// Check whether a persisted record exists.
    pub fn has_session(&self) -> StorageResult<bool> {
        self.storage.has(StorageKeys::SESSION)
    }
}
