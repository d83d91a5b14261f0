//! Save Manager - guarded persistence of the page document.
//!
//! The manager owns one primary key (`storage_key`) and the backup keys
//! derived from it (`{storage_key}_backup_{suffix}`). At most one save is in
//! flight per manager; a second caller fails fast with
//! [`PersistError::SaveInProgress`] instead of queueing.

use crate::backend::StorageBackend;
use crate::backup::BackupRecord;
use crate::error::{PersistError, Result, StorageError};
use chrono::Utc;
use pw_core::Document;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default key for the primary document.
pub const DEFAULT_STORAGE_KEY: &str = "pagewright_document";

/// Releases the save guard when dropped, including when the save future
/// is dropped before completion.
struct SaveGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Persists documents and backups through a storage backend.
pub struct SaveManager<S> {
    storage: S,
    storage_key: String,
    saving: AtomicBool,
}

impl<S: StorageBackend> SaveManager<S> {
    pub fn new(storage: S, storage_key: impl Into<String>) -> Self {
        Self {
            storage,
            storage_key: storage_key.into(),
            saving: AtomicBool::new(false),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Prefix shared by all backup keys.
    pub fn backup_prefix(&self) -> String {
        format!("{}_backup_", self.storage_key)
    }

    /// Whether a save is currently in flight.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<SaveGuard<'_>> {
        self.saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PersistError::SaveInProgress)?;
        Ok(SaveGuard { flag: &self.saving })
    }

    /// Persist `document` under the primary key.
    ///
    /// The stored copy gets `version + 1` and `last_modified = now`; it is
    /// returned so the caller can adopt the new stamps.
    pub async fn save(&self, document: &Document) -> Result<Document> {
        let _guard = self.acquire()?;

        let mut stored = document.clone();
        stored.version = document.version.saturating_add(1);
        stored.last_modified = Some(Utc::now());

        let json =
            serde_json::to_string(&stored).map_err(|e| PersistError::Storage(e.to_string()))?;

        if let Err(e) = self.storage.set(&self.storage_key, json).await {
            tracing::warn!(key = %self.storage_key, error = %e, "Save failed");
            return Err(e.into());
        }

        tracing::info!(
            key = %self.storage_key,
            version = stored.version,
            blocks = stored.len(),
            "Document saved"
        );
        Ok(stored)
    }

    /// Read the primary document.
    pub async fn load(&self) -> Result<Document> {
        let raw = self
            .storage
            .get(&self.storage_key)
            .await?
            .ok_or_else(|| PersistError::NotFound(self.storage_key.clone()))?;

        let document: Document = serde_json::from_str(&raw).map_err(|e| {
            PersistError::Storage(format!(
                "malformed document under '{}': {}",
                self.storage_key, e
            ))
        })?;

        tracing::debug!(key = %self.storage_key, version = document.version, "Document loaded");
        Ok(document)
    }

    /// Whether `current` differs in content from `last_saved`.
    ///
    /// With no saved document everything counts as unsaved.
    pub fn has_unsaved_changes(&self, current: &Document, last_saved: Option<&Document>) -> bool {
        match last_saved {
            Some(saved) => !current.same_content(saved),
            None => true,
        }
    }

    /// Store an independent copy of `document` under a backup key.
    ///
    /// The suffix defaults to the current time in epoch milliseconds. The
    /// primary document and the save guard are untouched.
    pub async fn create_backup(
        &self,
        document: &Document,
        suffix: Option<&str>,
    ) -> Result<BackupRecord> {
        let now = Utc::now();
        let suffix = match suffix {
            Some(s) => s.to_string(),
            None => now.timestamp_millis().to_string(),
        };
        let record = BackupRecord::new(
            format!("{}{}", self.backup_prefix(), suffix),
            document.clone(),
            now,
        );

        let json =
            serde_json::to_string(&record).map_err(|e| PersistError::Storage(e.to_string()))?;
        self.storage.set(&record.key, json).await?;

        tracing::info!(key = %record.key, blocks = record.document.len(), "Backup created");
        Ok(record)
    }

    /// All readable backups, newest first.
    ///
    /// Entries that cannot be parsed are logged and left out.
    pub async fn get_backups(&self) -> Result<Vec<BackupRecord>> {
        let keys = self.storage.keys_with_prefix(&self.backup_prefix()).await?;

        let mut backups = Vec::with_capacity(keys.len());
        for key in keys {
            match self.read_backup(&key).await {
                Ok(record) => backups.push(record),
                Err(PersistError::Parse { key, message }) => {
                    tracing::warn!(key = %key, error = %message, "Skipping unreadable backup");
                }
                Err(PersistError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        backups.sort_by(|a, b| {
            b.backed_up_at
                .cmp(&a.backed_up_at)
                .then_with(|| b.key.cmp(&a.key))
        });
        Ok(backups)
    }

    /// Load the document stored in one backup.
    pub async fn restore_backup(&self, key: &str) -> Result<Document> {
        if !key.starts_with(&self.backup_prefix()) {
            return Err(PersistError::NotFound(key.to_string()));
        }
        let record = self.read_backup(key).await?;
        tracing::info!(key = %key, "Backup restored");
        Ok(record.document)
    }

    /// Delete all but the `keep` newest backups; returns the removed keys.
    pub async fn prune_backups(&self, keep: usize) -> Result<Vec<String>> {
        let mut removed = Vec::new();
        for record in self.get_backups().await?.into_iter().skip(keep) {
            if self.storage.remove(&record.key).await? {
                removed.push(record.key);
            }
        }

        if !removed.is_empty() {
            tracing::info!(removed = removed.len(), kept = keep, "Pruned backups");
        }
        Ok(removed)
    }

    async fn read_backup(&self, key: &str) -> Result<BackupRecord> {
        let raw = match self.storage.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Err(PersistError::NotFound(key.to_string())),
            Err(StorageError::Corrupt { message, .. }) => {
                return Err(PersistError::Parse {
                    key: key.to_string(),
                    message,
                })
            }
            Err(e) => return Err(e.into()),
        };

        let mut record: BackupRecord =
            serde_json::from_str(&raw).map_err(|e| PersistError::Parse {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        record.key = key.to_string();
        Ok(record)
    }
}
