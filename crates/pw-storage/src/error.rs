//! Error types for persistence.

use thiserror::Error;

/// Faults raised by a storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),

    /// The stored bytes under `key` are not a readable value.
    #[error("Corrupt value under '{key}': {message}")]
    Corrupt { key: String, message: String },
}

/// Errors returned by the save manager.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// Nothing is stored under the key.
    #[error("No document stored under '{0}'")]
    NotFound(String),

    /// Another save through the same manager has not finished.
    #[error("A save is already in progress")]
    SaveInProgress,

    /// Read or write fault, including a malformed primary document.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A backup entry could not be parsed.
    #[error("Unreadable backup '{key}': {message}")]
    Parse { key: String, message: String },
}

impl From<StorageError> for PersistError {
    fn from(err: StorageError) -> Self {
        PersistError::Storage(err.to_string())
    }
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistError>;
