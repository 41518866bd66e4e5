//! Persistent key/value substrate and cross-tab change signal.
//!
//! DESIGN
//! ======
//! The platform contract is the browser's origin-scoped storage: a single
//! string-keyed, string-valued persistent map shared by every open tab, with
//! last-writer-wins semantics and no locking. `KeyValue` captures that shape
//! so the persistence layers above it stay backend-agnostic; `MemoryStore`
//! serves tests and headless use, `FileStore` a desktop shell.
//!
//! `LocalStore` pairs a backend with a broadcast channel: every successful
//! write announces its key, and any subscriber re-reads on notification. No
//! ordering or exactly-once delivery is promised — a lagging receiver simply
//! shows stale data until its next read.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage write failed: {0}")]
    Write(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The browser-storage shape: string keys, string values, origin-scoped.
pub trait KeyValue: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Best-effort delete; a missing key is not an error.
    fn remove(&self, key: &str);
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-memory backend for tests and headless use.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValue for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// File-backed backend: one JSON object per file, read on every get and
/// rewritten wholesale on every set. Matches the wholesale-overwrite lifecycle
/// of the snapshots stored through it.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> HashMap<String, String> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string(map).map_err(|e| StorageError::Write(e.to_string()))?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl KeyValue for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) {
        let mut map = self.read_map();
        if map.remove(key).is_some() {
            if let Err(e) = self.write_map(&map) {
                warn!(error = %e, key, "file store remove failed");
            }
        }
    }
}

// =============================================================================
// LOCAL STORE + CHANGE BROADCAST
// =============================================================================

/// Key that changed in the shared store.
#[derive(Debug, Clone)]
pub struct StorageEvent {
    pub key: String,
}

/// Shared handle over a `KeyValue` backend plus the change broadcast.
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValue>,
    changes: broadcast::Sender<StorageEvent>,
}

impl LocalStore {
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValue>) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self { backend, changes }
    }

    /// Convenience constructor over a fresh `MemoryStore`.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.backend.get(key)
    }

    /// Write a value and broadcast the key on success.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.backend.set(key, value)?;
        self.notify(key);
        Ok(())
    }

    /// Remove an entry and broadcast the key.
    pub fn remove(&self, key: &str) {
        self.backend.remove(key);
        self.notify(key);
    }

    /// Subscribe to change events. Receivers that fall behind miss events;
    /// they recover by re-reading.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.changes.subscribe()
    }

    fn notify(&self, key: &str) {
        // Send only fails when no receiver is subscribed.
        let _ = self.changes.send(StorageEvent { key: key.to_string() });
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
