//! Store module - persistent string key-value storage

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::Error;
use crate::Result;

/// Key under which the serialized history is stored
pub const HISTORY_KEY: &str = "guru.history";

/// Key under which the raw API key is stored
pub const API_KEY: &str = "guru.apiKey";

/// Persistent store trait - get/set/remove of string values
pub trait PersistentStore: Send + Sync {
    /// Read a value, `None` if the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// File-based store: a single JSON object of string values
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("store.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_content(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Storage(format!("Failed to read {:?}: {}", self.path, e)))?;
        Ok(Some(content).filter(|c| !c.trim().is_empty()))
    }

    fn decode(&self, content: &str) -> Result<BTreeMap<String, String>> {
        serde_json::from_str(content)
            .map_err(|e| Error::Storage(format!("Corrupt store {:?}: {}", self.path, e)))
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match self.read_content()? {
            Some(content) => self.decode(&content),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Entries to build a write on. An undecodable file is replaced rather
    /// than blocking every later write.
    fn read_for_write(&self) -> Result<BTreeMap<String, String>> {
        let Some(content) = self.read_content()? else {
            return Ok(BTreeMap::new());
        };
        match self.decode(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!("Discarding unreadable store: {}", e);
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create {:?}: {}", parent, e)))?;
        }

        // Write next to the target and rename so a crash never leaves a torn file
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&tmp, content)
            .map_err(|e| Error::Storage(format!("Failed to write {:?}: {}", tmp, e)))?;

        // The store holds the API key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&tmp, perms)?;
        }

        std::fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Storage(format!("Failed to replace {:?}: {}", self.path, e)))
    }
}

impl PersistentStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.read_for_write()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// In-memory store for testing and ephemeral sessions
pub struct InMemoryStore {
    entries: std::sync::Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: std::sync::Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Storage("In-memory store poisoned".to_string()))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistentStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
