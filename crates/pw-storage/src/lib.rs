//! # pw-storage
//!
//! Persistence for Pagewright documents.
//!
//! - [`StorageBackend`]: async key/value capability with in-memory and
//!   directory-backed implementations
//! - [`SaveManager`]: single-flight saves with version stamping, loading,
//!   change detection and backups
//!
//! ## Example
//!
//! ```rust
//! use pw_core::Document;
//! use pw_storage::{MemoryStorage, SaveManager};
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let manager = SaveManager::new(MemoryStorage::new(), "my_page");
//! let saved = manager.save(&Document::default()).await.unwrap();
//! assert_eq!(saved.version, 1);
//!
//! let loaded = manager.load().await.unwrap();
//! assert!(loaded.same_content(&saved));
//! # });
//! # }
//! ```

pub mod backend;
pub mod backup;
pub mod error;
pub mod file;
pub mod save_manager;

pub use backend::{MemoryStorage, StorageBackend};
pub use backup::BackupRecord;
pub use error::{PersistError, Result, StorageError};
pub use file::FileStorage;
pub use save_manager::{SaveManager, DEFAULT_STORAGE_KEY};
