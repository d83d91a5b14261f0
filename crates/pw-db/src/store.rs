//! Document Store - the mutation API over a single page document.
//!
//! Provides:
//! - Block insertion, removal, duplication, reordering and partial updates
//! - Selection and current-language view state
//! - Undo/redo through the history manager
//!
//! Every structural or content mutation is funneled through [`DocumentStore::apply`],
//! which snapshots the document first, so each public mutator is exactly one
//! undo step. Mutations that change nothing are not recorded.

use crate::error::HistoryError;
use crate::history::{HistoryManager, Snapshot};
use crate::mutation::{BlockUpdate, Mutation, MutationOutcome};
use chrono::{DateTime, Utc};
use pw_core::{Block, BlockId, BlockType, ContentObject, Document, LanguageCode};

/// Owns the live document and its undo history.
#[derive(Clone, Debug)]
pub struct DocumentStore {
    document: Document,
    history: HistoryManager,
}

impl DocumentStore {
    /// Create a store around an existing document.
    pub fn new(document: Document) -> Self {
        Self {
            document,
            history: HistoryManager::new(),
        }
    }

    /// Create a store with a custom undo depth (0 = unbounded).
    pub fn with_max_history(document: Document, max_history: usize) -> Self {
        Self {
            document,
            history: HistoryManager::with_max_history(max_history),
        }
    }

    // === Reads ===

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn blocks(&self) -> &[Block] {
        &self.document.blocks
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.document.block(id)
    }

    pub fn index_of(&self, id: &BlockId) -> Option<usize> {
        self.document.index_of(id)
    }

    pub fn len(&self) -> usize {
        self.document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    pub fn selected_block_id(&self) -> Option<&BlockId> {
        self.document.selected_block_id.as_ref()
    }

    pub fn selected_block(&self) -> Option<&Block> {
        self.document.selected_block()
    }

    pub fn current_language(&self) -> &LanguageCode {
        &self.document.current_language
    }

    /// Content of a block in the current language, falling back to the default.
    pub fn resolved_content(&self, id: &BlockId) -> Option<&ContentObject> {
        self.document.resolved_content(id)
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    // === Mutations ===

    /// Insert a block with default content; returns its id.
    pub fn add_block(&mut self, block_type: BlockType, at_index: Option<usize>) -> BlockId {
        let block = Block::new(
            block_type,
            &self.document.languages,
            &self.document.default_language,
        );
        let id = block.id().clone();
        self.apply(Mutation::AddBlock { block, at_index });
        id
    }

    /// Remove a block. Returns false if the id is unknown.
    pub fn remove_block(&mut self, id: &BlockId) -> bool {
        self.apply(Mutation::RemoveBlock { id: id.clone() })
            .is_effective()
    }

    /// Duplicate a block right after itself; returns the copy's id.
    pub fn duplicate_block(&mut self, id: &BlockId) -> Option<BlockId> {
        self.apply(Mutation::DuplicateBlock { id: id.clone() })
            .created_block()
            .cloned()
    }

    /// Move a block; `to_index` is clamped to the valid range.
    pub fn reorder_block(&mut self, id: &BlockId, to_index: usize) -> bool {
        self.apply(Mutation::ReorderBlock {
            id: id.clone(),
            to_index,
        })
        .is_effective()
    }

    /// Merge a partial update into a block.
    pub fn update_block(&mut self, id: &BlockId, update: BlockUpdate) -> bool {
        self.apply(Mutation::UpdateBlock {
            id: id.clone(),
            update,
        })
        .is_effective()
    }

    /// Apply a mutation as a single undoable step.
    pub fn apply(&mut self, mutation: Mutation) -> MutationOutcome {
        let before = Snapshot::capture(&self.document);
        let label = mutation.label();
        let outcome = self.apply_unrecorded(mutation);

        if outcome.is_effective() {
            self.history.record(before, label);
        }
        outcome
    }

    fn apply_unrecorded(&mut self, mutation: Mutation) -> MutationOutcome {
        let doc = &mut self.document;

        match mutation {
            Mutation::AddBlock { block, at_index } => {
                if doc.contains(block.id()) {
                    return MutationOutcome::Noop;
                }
                let id = block.id().clone();
                let index = at_index.unwrap_or(doc.blocks.len()).min(doc.blocks.len());
                doc.blocks.insert(index, block);
                MutationOutcome::Added { id, index }
            }

            Mutation::RemoveBlock { id } => {
                let Some(index) = doc.index_of(&id) else {
                    return MutationOutcome::Noop;
                };
                doc.blocks.remove(index);
                if doc.selected_block_id.as_ref() == Some(&id) {
                    doc.selected_block_id = None;
                }
                MutationOutcome::Removed { id, index }
            }

            Mutation::DuplicateBlock { id } => {
                let Some(source_index) = doc.index_of(&id) else {
                    return MutationOutcome::Noop;
                };
                let copy = doc.blocks[source_index].duplicate();
                let copy_id = copy.id().clone();
                doc.blocks.insert(source_index + 1, copy);
                MutationOutcome::Duplicated {
                    source: id,
                    id: copy_id,
                    index: source_index + 1,
                }
            }

            Mutation::ReorderBlock { id, to_index } => {
                let Some(from) = doc.index_of(&id) else {
                    return MutationOutcome::Noop;
                };
                let to = to_index.min(doc.blocks.len() - 1);
                if from == to {
                    return MutationOutcome::Noop;
                }
                let block = doc.blocks.remove(from);
                doc.blocks.insert(to, block);
                MutationOutcome::Moved { id, from, to }
            }

            Mutation::UpdateBlock { id, update } => {
                let language = doc.current_language.clone();
                let Some(block) = doc.block_mut(&id) else {
                    return MutationOutcome::Noop;
                };

                let mut updated = block.clone();
                if let Some(content) = &update.content {
                    updated.content.merge(&language, content);
                }
                if let Some(settings) = update.settings {
                    updated.settings.extend(settings);
                }

                if updated == *block {
                    return MutationOutcome::Noop;
                }
                *block = updated;
                MutationOutcome::Updated { id }
            }
        }
    }

    // === View state ===

    /// Select a block, or clear the selection with `None`.
    ///
    /// Selecting an id that is not in the document clears the selection.
    pub fn set_selection(&mut self, id: Option<BlockId>) {
        self.document.selected_block_id = id.filter(|id| self.document.contains(id));
    }

    /// Switch the language being edited. Content is untouched.
    pub fn set_current_language(&mut self, language: impl Into<LanguageCode>) {
        self.document.current_language = language.into();
    }

    // === History ===

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Undo the last mutation. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.try_undo().is_ok()
    }

    /// Redo the last undone mutation. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        self.try_redo().is_ok()
    }

    /// Undo, reporting why nothing happened.
    pub fn try_undo(&mut self) -> Result<(), HistoryError> {
        let current = Snapshot::capture(&self.document);
        let previous = self.history.undo(current)?;
        previous.restore_into(&mut self.document);
        Ok(())
    }

    /// Redo, reporting why nothing happened.
    pub fn try_redo(&mut self) -> Result<(), HistoryError> {
        let current = Snapshot::capture(&self.document);
        let next = self.history.redo(current)?;
        next.restore_into(&mut self.document);
        Ok(())
    }

    // === Persistence hooks ===

    /// Record the stamps of a successful save on the live document.
    pub fn mark_saved(&mut self, version: u64, last_modified: DateTime<Utc>) {
        self.document.version = version;
        self.document.last_modified = Some(last_modified);
    }

    /// Install a new baseline document and forget all history.
    pub fn replace_document(&mut self, document: Document) {
        self.document = document;
        self.history.clear();
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(Document::default())
    }
}
