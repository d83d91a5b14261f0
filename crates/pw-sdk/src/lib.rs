//! # pw-sdk
//!
//! High-level editing API for Pagewright pages.
//!
//! An [`EditorSession`] ties together the document store, its undo history,
//! the save manager and a debounced [`AutosaveController`]. Keyboard input is
//! mapped to commands by a [`Keymap`] and run through [`dispatch`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pw_sdk::prelude::*;
//! use pw_storage::MemoryStorage;
//!
//! # async fn run() -> pw_sdk::Result<()> {
//! let config = EditorConfigBuilder::new()
//!     .languages(["en", "es"])
//!     .build();
//! let session = EditorSession::open(MemoryStorage::new(), config).await?;
//!
//! let hero = session.add_block(BlockType::Hero, None);
//! session.set_selection(Some(hero));
//!
//! let keymap = Keymap::default();
//! let outcome = dispatch(&session, &keymap, KeyChord::new(Key::Char('z')).ctrl()).await;
//! assert_eq!(outcome.message(), Some("Undone"));
//!
//! session.save().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`session`] - editing sessions and their events
//! - [`autosave`] - debounced saving and observable save status
//! - [`dispatcher`] - keymaps, commands and dispatch outcomes
//! - [`notify`] - fire-and-forget user notifications
//! - [`config`] - session and autosave configuration
//! - [`error`] - error types

pub mod autosave;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod notify;
pub mod session;

// Re-exports for convenience
pub use autosave::{AutosaveController, AutosavePhase, AutosaveStatus, SaveOutcome, SavedHook};
pub use config::{
    AutosaveConfig, AutosaveConfigBuilder, EditorConfig, EditorConfigBuilder, ErrorCallback,
    SuccessCallback, DEFAULT_AUTOSAVE_DELAY,
};
pub use dispatcher::{dispatch, execute, Command, DispatchOutcome, Key, KeyChord, Keymap};
pub use error::{AutosaveError, Result, SdkError};
pub use notify::{BroadcastNotifier, Notification, NotificationLevel, Notifier};
pub use session::{EditorSession, SessionEvent};

pub use pw_core::{Block, BlockId, BlockType, Document, LanguageCode};
pub use pw_db::{BlockUpdate, Mutation, MutationOutcome};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::autosave::{AutosavePhase, AutosaveStatus, SaveOutcome};
    pub use crate::config::{AutosaveConfigBuilder, EditorConfig, EditorConfigBuilder};
    pub use crate::dispatcher::{dispatch, Command, DispatchOutcome, Key, KeyChord, Keymap};
    pub use crate::error::SdkError;
    pub use crate::notify::{BroadcastNotifier, Notification, Notifier};
    pub use crate::session::{EditorSession, SessionEvent};
    pub use pw_core::{BlockId, BlockType, Document};
    pub use pw_db::BlockUpdate;
}
