//! Error types for the document layer.

use thiserror::Error;

/// Errors reported by the history manager.
///
/// Document store mutators never fail; an unknown block id is a no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

pub type Result<T> = std::result::Result<T, HistoryError>;
