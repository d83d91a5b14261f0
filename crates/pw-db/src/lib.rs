//! # pw-db
//!
//! In-memory document layer for Pagewright.
//!
//! This crate provides:
//! - `DocumentStore`: the mutation API over one page document
//! - `HistoryManager`: snapshot-based undo/redo with a bounded depth
//! - `Mutation` / `MutationOutcome`: descriptors for every undoable change
//!
//! All operations are synchronous and never fail for well-formed input.
//! Unknown block ids are silent no-ops; undo/redo on an empty stack report
//! `false` (or `HistoryError` through the `try_` variants).
//!
//! ## Example
//!
//! ```rust
//! use pw_db::DocumentStore;
//! use pw_core::BlockType;
//!
//! let mut store = DocumentStore::default();
//! let hero = store.add_block(BlockType::Hero, None);
//! let cta = store.add_block(BlockType::CallToAction, None);
//!
//! store.reorder_block(&cta, 0);
//! assert_eq!(store.index_of(&hero), Some(1));
//!
//! assert!(store.undo());
//! assert_eq!(store.index_of(&hero), Some(0));
//! assert!(store.redo());
//! ```

pub mod error;
pub mod history;
pub mod mutation;
pub mod store;

pub use error::HistoryError;
pub use history::{HistoryEntry, HistoryManager, Snapshot, DEFAULT_MAX_HISTORY};
pub use mutation::{BlockUpdate, Mutation, MutationOutcome};
pub use store::DocumentStore;
