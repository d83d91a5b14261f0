//! Mutation descriptors.
//!
//! Each structural or content change to a document is described by a
//! `Mutation` and applied through `DocumentStore::apply`, which records it
//! as exactly one undo step.

use pw_core::{Block, BlockId, ContentObject, Settings};
use serde::{Deserialize, Serialize};

/// A partial update for a block.
///
/// `content` is merged into the variant for the store's current language,
/// `settings` into the block settings. Keys not mentioned are preserved.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl BlockUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update content fields only.
    pub fn content(content: ContentObject) -> Self {
        Self {
            content: Some(content),
            settings: None,
        }
    }

    /// Update settings only.
    pub fn settings(settings: Settings) -> Self {
        Self {
            content: None,
            settings: Some(settings),
        }
    }

    /// Set a single content field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.content
            .get_or_insert_with(ContentObject::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set a single setting.
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.settings
            .get_or_insert_with(Settings::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.as_ref().map_or(true, |c| c.is_empty())
            && self.settings.as_ref().map_or(true, |s| s.is_empty())
    }
}

/// An undoable change to a document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    /// Insert a new block (at the end when `at_index` is `None`).
    AddBlock {
        block: Block,
        at_index: Option<usize>,
    },
    /// Remove a block.
    RemoveBlock { id: BlockId },
    /// Clone a block right after itself.
    DuplicateBlock { id: BlockId },
    /// Move a block to a new position.
    ReorderBlock { id: BlockId, to_index: usize },
    /// Merge a partial update into a block.
    UpdateBlock { id: BlockId, update: BlockUpdate },
}

impl Mutation {
    /// Short description for undo/redo messaging.
    pub fn label(&self) -> String {
        match self {
            Mutation::AddBlock { block, .. } => {
                format!("Add {} block", block.block_type.label().to_lowercase())
            }
            Mutation::RemoveBlock { .. } => "Remove block".to_string(),
            Mutation::DuplicateBlock { .. } => "Duplicate block".to_string(),
            Mutation::ReorderBlock { .. } => "Move block".to_string(),
            Mutation::UpdateBlock { .. } => "Edit block".to_string(),
        }
    }
}

/// What a mutation actually did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    Added { id: BlockId, index: usize },
    Removed { id: BlockId, index: usize },
    Duplicated { source: BlockId, id: BlockId, index: usize },
    Moved { id: BlockId, from: usize, to: usize },
    Updated { id: BlockId },
    /// Nothing changed (unknown id, same position, empty update).
    Noop,
}

impl MutationOutcome {
    /// Whether the document changed.
    pub fn is_effective(&self) -> bool {
        !matches!(self, MutationOutcome::Noop)
    }

    /// The block created by the mutation, if any.
    pub fn created_block(&self) -> Option<&BlockId> {
        match self {
            MutationOutcome::Added { id, .. } | MutationOutcome::Duplicated { id, .. } => Some(id),
            _ => None,
        }
    }
}
