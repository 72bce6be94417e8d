//! Local key-value persistence for the crash history and the leaderboard
//!
//! Values are JSON strings keyed by collection name, the same shape a browser
//! `localStorage` would hold.

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::StorageError;
use serde::{de::DeserializeOwned, Serialize};
use rocksdb::{DBCompressionType, Options, DB};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

pub const HISTORY_KEY: &str = "aviator_history";
pub const LEADERBOARD_KEY: &str = "aviator_leaderboard";

/// Minimal string key-value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store; contents vanish with the process
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::ReadFailed("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::WriteFailed("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::WriteFailed("memory store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

/// RocksDB-backed store holding one JSON record per collection key
#[derive(Clone)]
pub struct RocksStore {
    db: Arc<DB>,
}

impl RocksStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(DBCompressionType::Lz4);

        let db = DB::open(&opts, path).map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Ok(Self { db: Arc::new(db) })
    }
}

impl KeyValueStore for RocksStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let Some(bytes) = self
            .db
            .get(key.as_bytes())
            .map_err(|e| StorageError::ReadFailed(format!("{}: {}", key, e)))?
        else {
            return Ok(None);
        };

        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StorageError::CorruptedData(format!("{} is not UTF-8: {}", key, e)))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.db.put(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.db.delete(key.as_bytes())?;
        Ok(())
    }
}

/// Open the backend selected in configuration
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::Rocksdb => Ok(Arc::new(RocksStore::open(&config.data_dir)?)),
    }
}

/// Load a persisted sequence. Missing or malformed data yields an empty one,
/// and a malformed record is removed so the next write starts clean.
pub fn load_collection<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read persisted collection, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding malformed persisted collection");
            if let Err(e) = store.delete(key) {
                tracing::warn!(key, error = %e, "Failed to remove malformed collection");
            }
            Vec::new()
        }
    }
}

/// Serialize and write a sequence under `key`
pub fn store_collection<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<(), StorageError> {
    let json = serde_json::to_string(items).map_err(|e| {
        StorageError::WriteFailed(format!("Failed to encode {}: {}", key, e))
    })?;
    store.put(key, &json)
}
