//! File-backed storage.
//!
//! The original console persisted its session in the renderer's local
//! storage; the equivalent here is a flat JSON map on disk under the
//! console's base directory.

use crate::{StorageBackend, StorageError, StorageResult};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Key-value storage persisted as a single JSON file.
pub struct FileStorage {
    path: PathBuf,
    data: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or create) file storage at the given path.
    ///
    /// A missing file yields an empty map; it is created on first write.
    pub fn new(path: PathBuf) -> StorageResult<Self> {
        let data = if path.exists() {
            tracing::debug!(path = %path.display(), "Loading persisted storage");
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| StorageError::Encoding(e.to_string()))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Write the current map to disk.
    ///
    /// Writes to a sibling temp file and renames it into place so a crash
    /// mid-write never leaves a truncated session file behind.
    fn flush(&self, data: &HashMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut data = self.data.lock().unwrap();
        data.insert(key.to_string(), value.to_string());
        self.flush(&data)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let data = self.data.lock().unwrap();
        Ok(data.get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let mut data = self.data.lock().unwrap();
        let removed = data.remove(key).is_some();
        if removed {
            self.flush(&data)?;
        }
        Ok(removed)
    }
}
