//! In-memory key-value store

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::KeyValueStore;
use crate::error::{Error, Result};

/// `HashMap`-backed store for tests and ephemeral sessions.
///
/// Writes to individual keys can be made to fail with [`MemoryStore::fail_writes`]
/// to exercise storage-failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    failing_keys: Mutex<HashSet<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write or removal of `key` fail
    pub fn fail_writes(&self, key: &str) {
        if let Ok(mut failing) = self.failing_keys.lock() {
            failing.insert(key.to_string());
        }
    }

    /// Undo [`MemoryStore::fail_writes`] for `key`
    pub fn heal(&self, key: &str) {
        if let Ok(mut failing) = self.failing_keys.lock() {
            failing.remove(key);
        }
    }

    /// Snapshot of the stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys = self
            .values
            .lock()
            .map(|values| values.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn values(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        let failing = self
            .failing_keys
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))?;
        if failing.contains(key) {
            return Err(Error::Storage(format!("write rejected for key '{key}'")));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable(key)?;
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        self.values()?.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.values()?.clear();
        Ok(())
    }
}
