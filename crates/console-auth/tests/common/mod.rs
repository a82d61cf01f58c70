#![allow(dead_code)]

use console_auth::SessionManager;
use console_storage::{
    OrganizationMembership, SessionRecord, SessionStore, StorageBackend, StorageResult,
    UserProfile,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory storage whose map stays visible to the test for inspection.
#[derive(Clone, Default)]
pub struct SharedStorage {
    data: Arc<Mutex<HashMap<String, String>>>,
}

impl SharedStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }
}

impl StorageBackend for SharedStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        Ok(self.data.lock().unwrap().remove(key).is_some())
    }
}

pub fn test_user() -> UserProfile {
    UserProfile {
        id: "user-123".to_string(),
        email: "a@b.com".to_string(),
        full_name: "Ada Lovelace".to_string(),
        is_admin: false,
        organizations: vec![OrganizationMembership {
            id: "org-1".to_string(),
            name: "Acme".to_string(),
            role: "member".to_string(),
        }],
    }
}

/// A fully authenticated record, as a prior login would have left it.
pub fn seeded_record() -> SessionRecord {
    SessionRecord {
        user: Some(test_user()),
        access_token: Some("stale-access-token".to_string()),
        refresh_token: Some("refresh-token".to_string()),
        is_authenticated: true,
    }
}

pub fn manager_with(storage: SharedStorage, api_url: &str) -> SessionManager {
    let store = SessionStore::new(Box::new(storage));
    SessionManager::new(store, api_url).expect("session manager")
}

/// Manager hydrated from a pre-seeded authenticated session.
pub fn seeded_manager(storage: SharedStorage, api_url: &str) -> SessionManager {
    let store = SessionStore::new(Box::new(storage.clone()));
    store.save(&seeded_record()).expect("seed session");
    manager_with(storage, api_url)
}

pub fn user_json() -> serde_json::Value {
    serde_json::json!({
        "id": "user-123",
        "email": "a@b.com",
        "full_name": "Ada Lovelace",
        "is_admin": false,
        "organizations": [
            {"id": "org-1", "name": "Acme", "role": "member"}
        ]
    })
}
