//! Undo/Redo History - snapshot-based rollback for the document store.
//!
//! Every mutation pushes the pre-mutation snapshot onto the `past` stack
//! and clears `future`. Undo and redo shuttle snapshots between the two
//! stacks, so there is never more than one timeline.
//!
//! Snapshots capture blocks plus the selection at capture time. Selection
//! and language are view state: undo and redo keep the live selection, and
//! only reinstate a captured one for a block that the step brings back.

use crate::error::{HistoryError, Result};
use pw_core::{Block, BlockId, Document};
use std::collections::VecDeque;

/// Default number of undo levels kept.
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// A captured copy of the undoable part of a document.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub blocks: Vec<Block>,
    pub selected_block_id: Option<BlockId>,
}

impl Snapshot {
    /// Capture the undoable state of `document`.
    pub fn capture(document: &Document) -> Self {
        Self {
            blocks: document.blocks.clone(),
            selected_block_id: document.selected_block_id.clone(),
        }
    }

    /// Write this snapshot's blocks back into `document`.
    ///
    /// The live selection is kept while it resolves to a restored block. If
    /// there is none, the captured selection is reinstated when its block is
    /// one this restore brings back (undoing the removal that cleared it).
    /// A selection that does not resolve is dropped.
    pub fn restore_into(self, document: &mut Document) {
        let live = document
            .selected_block_id
            .take()
            .filter(|id| contains(&self.blocks, id));
        let selection = match live {
            Some(id) => Some(id),
            None => self
                .selected_block_id
                .filter(|id| contains(&self.blocks, id) && !contains(&document.blocks, id)),
        };
        document.blocks = self.blocks;
        document.selected_block_id = selection;
    }
}

fn contains(blocks: &[Block], id: &BlockId) -> bool {
    blocks.iter().any(|b| b.id() == id)
}

/// One step of history: the state before a mutation and what the mutation was.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    snapshot: Snapshot,
    label: String,
}

impl HistoryEntry {
    pub fn new(snapshot: Snapshot, label: impl Into<String>) -> Self {
        Self {
            snapshot,
            label: label.into(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Description of the mutation this entry rolls back.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Two-stack undo/redo manager.
#[derive(Clone, Debug)]
pub struct HistoryManager {
    /// States before each applied mutation (most recent last).
    past: VecDeque<HistoryEntry>,
    /// States undone, available for redo (most recent last).
    future: Vec<HistoryEntry>,
    /// Maximum undo depth (0 = unbounded).
    max_history: usize,
}

impl HistoryManager {
    /// Create a history with the default depth.
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }

    /// Create a history with a custom depth (0 = unbounded).
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            max_history,
        }
    }

    /// Set the maximum depth, evicting the oldest entries if needed.
    pub fn set_max_history(&mut self, max: usize) {
        self.max_history = max;
        self.trim();
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Record the state before a mutation.
    ///
    /// Any redo entries are discarded.
    pub fn record(&mut self, before: Snapshot, label: impl Into<String>) {
        self.past.push_back(HistoryEntry::new(before, label));
        self.future.clear();
        self.trim();
    }

    /// Step back one mutation.
    ///
    /// `current` is the live state; it becomes the redo target. Returns the
    /// state to restore.
    pub fn undo(&mut self, current: Snapshot) -> Result<Snapshot> {
        let entry = self.past.pop_back().ok_or(HistoryError::NothingToUndo)?;
        self.future.push(HistoryEntry::new(current, entry.label.clone()));
        Ok(entry.snapshot)
    }

    /// Step forward one undone mutation.
    pub fn redo(&mut self, current: Snapshot) -> Result<Snapshot> {
        let entry = self.future.pop().ok_or(HistoryError::NothingToRedo)?;
        self.past.push_back(HistoryEntry::new(current, entry.label.clone()));
        Ok(entry.snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    /// Label of the mutation the next undo would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.past.back().map(|e| e.label())
    }

    /// Label of the mutation the next redo would reapply.
    pub fn redo_label(&self) -> Option<&str> {
        self.future.last().map(|e| e.label())
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    fn trim(&mut self) {
        if self.max_history == 0 {
            return;
        }
        while self.past.len() > self.max_history {
            self.past.pop_front();
        }
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pw_core::BlockType;

    fn snapshot_with(n: usize) -> Snapshot {
        let doc = Document::default();
        let blocks = (0..n)
            .map(|_| Block::new(BlockType::About, &doc.languages, &doc.default_language))
            .collect();
        Snapshot {
            blocks,
            selected_block_id: None,
        }
    }

    #[test]
    fn test_empty_history() {
        let mut history = HistoryManager::new();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.undo(snapshot_with(0)), Err(HistoryError::NothingToUndo));
        assert_eq!(history.redo(snapshot_with(0)), Err(HistoryError::NothingToRedo));
    }

    #[test]
    fn test_undo_then_redo() {
        let mut history = HistoryManager::new();
        let before = snapshot_with(1);
        let after = snapshot_with(2);

        history.record(before.clone(), "Add block");
        assert_eq!(history.undo_label(), Some("Add block"));

        let restored = history.undo(after.clone()).unwrap();
        assert_eq!(restored, before);
        assert!(history.can_redo());
        assert_eq!(history.redo_label(), Some("Add block"));

        let reapplied = history.redo(restored).unwrap();
        assert_eq!(reapplied, after);
        assert!(!history.can_redo());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = HistoryManager::new();
        history.record(snapshot_with(0), "first");
        history.undo(snapshot_with(1)).unwrap();
        assert!(history.can_redo());

        history.record(snapshot_with(0), "second");
        assert!(!history.can_redo());
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_max_history() {
        let mut history = HistoryManager::with_max_history(5);
        for i in 0..10 {
            history.record(snapshot_with(i), format!("step {}", i));
        }

        assert_eq!(history.undo_depth(), 5);
        assert_eq!(history.undo_label(), Some("step 9"));

        history.set_max_history(2);
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_unbounded_history() {
        let mut history = HistoryManager::with_max_history(0);
        for i in 0..250 {
            history.record(snapshot_with(0), format!("step {}", i));
        }
        assert_eq!(history.undo_depth(), 250);
    }

    #[test]
    fn test_restore_drops_dangling_selection() {
        let mut doc = Document::default();
        let snapshot = Snapshot {
            blocks: Vec::new(),
            selected_block_id: Some(BlockId::from_string("gone")),
        };
        snapshot.restore_into(&mut doc);
        assert!(doc.selected_block_id.is_none());
    }

    #[test]
    fn test_restore_keeps_live_selection() {
        let mut doc = Document::default();
        let snapshot = snapshot_with(2);
        let first = snapshot.blocks[0].id().clone();
        let second = snapshot.blocks[1].id().clone();
        doc.blocks = snapshot.blocks.clone();
        doc.selected_block_id = Some(second.clone());

        let mut captured = snapshot;
        captured.selected_block_id = Some(first);
        captured.restore_into(&mut doc);
        assert_eq!(doc.selected_block_id, Some(second));
    }
}
