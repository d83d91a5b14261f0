//! Error types for the Pagewright SDK.

use pw_storage::PersistError;
use thiserror::Error;

/// Errors from the autosave controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AutosaveError {
    /// A save started by the controller has not finished yet.
    #[error("Autosave is busy")]
    Busy,

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Error type for session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdkError {
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Autosave error: {0}")]
    Autosave(#[from] AutosaveError),
}

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;
