//! Storage backend abstraction.
//!
//! A backend is a flat, string-keyed store of serialized values. The save
//! manager is the only component that interprets what is stored.

use crate::error::StorageError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Abstract key/value storage.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// All keys starting with `prefix`, in ascending order.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Delete `key`. Returns whether it existed.
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;
}

#[async_trait]
impl<S: StorageBackend + ?Sized> StorageBackend for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        (**self).keys_with_prefix(prefix).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        (**self).remove(key).await
    }
}

/// In-process storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of `set` calls served so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw value under `key`, bypassing the async interface.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .entries
            .read()
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.entries.write().remove(key).is_some())
    }
}
