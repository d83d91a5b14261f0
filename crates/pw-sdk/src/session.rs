//! Editing sessions: one document, its history, persistence and autosave.

use crate::autosave::{AutosaveController, AutosavePhase, AutosaveStatus, SaveOutcome};
use crate::config::EditorConfig;
use crate::error::Result;
use crate::notify::{Notification, Notifier};
use parking_lot::RwLock;
use pw_core::{Block, BlockId, BlockType, Document, LanguageCode};
use pw_db::{BlockUpdate, DocumentStore, Mutation, MutationOutcome};
use pw_storage::{BackupRecord, PersistError, SaveManager, StorageBackend};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Events emitted by a session.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// A mutation changed the document.
    Changed(MutationOutcome),
    SelectionChanged(Option<BlockId>),
    LanguageChanged(LanguageCode),
    Undone,
    Redone,
    /// A save completed (manual, forced or scheduled).
    Saved { version: u64 },
    BackupCreated { key: String },
    /// A backup replaced the live document.
    Restored { key: String },
    Closed,
}

/// An open page: the document store plus everything that persists it.
///
/// Store operations are synchronous; persistence is async. The store lock
/// is never held across an await.
pub struct EditorSession<S: StorageBackend> {
    config: EditorConfig,
    store: Arc<RwLock<DocumentStore>>,
    manager: Arc<SaveManager<S>>,
    autosave: AutosaveController<S>,
    notifier: Option<Arc<dyn Notifier>>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl<S: StorageBackend> EditorSession<S> {
    /// Open the document stored under `config.storage_key`, or start a new one.
    pub async fn open(storage: S, config: EditorConfig) -> Result<Self> {
        Self::open_with_notifier(storage, config, None).await
    }

    /// Like [`EditorSession::open`], posting notifications to `notifier`.
    pub async fn open_with_notifier(
        storage: S,
        config: EditorConfig,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Result<Self> {
        let manager = Arc::new(SaveManager::new(storage, config.storage_key.clone()));

        let (document, loaded) = match manager.load().await {
            Ok(document) => (document, true),
            Err(PersistError::NotFound(_)) => (config.new_document(), false),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            key = %config.storage_key,
            loaded,
            blocks = document.len(),
            "Session opened"
        );

        let autosave =
            AutosaveController::new(manager.clone(), config.autosave.clone(), notifier.clone());
        if loaded {
            autosave.mark_saved_baseline(&document);
        } else {
            autosave.observe(document.clone());
        }

        let store = Arc::new(RwLock::new(DocumentStore::with_max_history(
            document,
            config.max_history,
        )));
        let (event_tx, _) = broadcast::channel(100);

        {
            let store = store.clone();
            let event_tx = event_tx.clone();
            autosave.set_saved_hook(Arc::new(move |stored: &Document| {
                if let Some(last_modified) = stored.last_modified {
                    store.write().mark_saved(stored.version, last_modified);
                }
                let _ = event_tx.send(SessionEvent::Saved {
                    version: stored.version,
                });
            }));
        }

        Ok(Self {
            config,
            store,
            manager,
            autosave,
            notifier,
            event_tx,
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn save_manager(&self) -> &Arc<SaveManager<S>> {
        &self.manager
    }

    pub fn autosave(&self) -> &AutosaveController<S> {
        &self.autosave
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Post a notification, if a notifier is attached.
    pub fn notify(&self, notification: Notification) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(notification);
        }
    }

    // === Reads ===

    /// Run `f` against the store under a read lock.
    pub fn read<R>(&self, f: impl FnOnce(&DocumentStore) -> R) -> R {
        f(&self.store.read())
    }

    /// A copy of the live document.
    pub fn document(&self) -> Document {
        self.store.read().document().clone()
    }

    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    pub fn block_ids(&self) -> Vec<BlockId> {
        self.store
            .read()
            .blocks()
            .iter()
            .map(|b| b.id().clone())
            .collect()
    }

    pub fn selected_block_id(&self) -> Option<BlockId> {
        self.store.read().selected_block_id().cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.store.read().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.read().can_redo()
    }

    /// Whether the live document differs from the last save.
    pub fn has_unsaved_changes(&self) -> bool {
        self.autosave.has_unsaved_changes(&self.document())
    }

    // === Mutations ===

    pub fn add_block(&self, block_type: BlockType, at_index: Option<usize>) -> BlockId {
        let block = {
            let store = self.store.read();
            let doc = store.document();
            Block::new(block_type, &doc.languages, &doc.default_language)
        };
        let id = block.id().clone();
        self.apply(Mutation::AddBlock { block, at_index });
        id
    }

    pub fn remove_block(&self, id: &BlockId) -> bool {
        self.apply(Mutation::RemoveBlock { id: id.clone() })
            .is_effective()
    }

    pub fn duplicate_block(&self, id: &BlockId) -> Option<BlockId> {
        self.apply(Mutation::DuplicateBlock { id: id.clone() })
            .created_block()
            .cloned()
    }

    pub fn reorder_block(&self, id: &BlockId, to_index: usize) -> bool {
        self.apply(Mutation::ReorderBlock {
            id: id.clone(),
            to_index,
        })
        .is_effective()
    }

    pub fn update_block(&self, id: &BlockId, update: BlockUpdate) -> bool {
        self.apply(Mutation::UpdateBlock {
            id: id.clone(),
            update,
        })
        .is_effective()
    }

    /// Apply a mutation; effective ones restart the autosave timer.
    pub fn apply(&self, mutation: Mutation) -> MutationOutcome {
        let (outcome, snapshot) = {
            let mut store = self.store.write();
            let outcome = store.apply(mutation);
            let snapshot = outcome
                .is_effective()
                .then(|| store.document().clone());
            (outcome, snapshot)
        };

        if let Some(document) = snapshot {
            self.autosave.notify_change(document);
            let _ = self.event_tx.send(SessionEvent::Changed(outcome.clone()));
        }
        outcome
    }

    pub fn set_selection(&self, id: Option<BlockId>) {
        let (selected, document) = {
            let mut store = self.store.write();
            store.set_selection(id);
            (store.selected_block_id().cloned(), store.document().clone())
        };
        self.autosave.observe(document);
        let _ = self.event_tx.send(SessionEvent::SelectionChanged(selected));
    }

    pub fn set_current_language(&self, language: impl Into<LanguageCode>) {
        let language = language.into();
        let document = {
            let mut store = self.store.write();
            store.set_current_language(language.clone());
            store.document().clone()
        };
        self.autosave.observe(document);
        let _ = self.event_tx.send(SessionEvent::LanguageChanged(language));
    }

    // === History ===

    /// Undo the last mutation. Returns false when there is nothing to undo.
    pub fn undo(&self) -> bool {
        self.step(|store| store.undo(), SessionEvent::Undone)
    }

    /// Redo the last undone mutation. Returns false when there is nothing to redo.
    pub fn redo(&self) -> bool {
        self.step(|store| store.redo(), SessionEvent::Redone)
    }

    fn step(&self, op: impl FnOnce(&mut DocumentStore) -> bool, event: SessionEvent) -> bool {
        let document = {
            let mut store = self.store.write();
            if !op(&mut store) {
                return false;
            }
            store.document().clone()
        };
        self.autosave.notify_change(document);
        let _ = self.event_tx.send(event);
        true
    }

    // === Persistence ===

    /// Save now, skipping the write when nothing changed.
    pub async fn save(&self) -> Result<SaveOutcome> {
        self.autosave.observe(self.document());
        Ok(self.autosave.save().await?)
    }

    /// Save now unconditionally.
    pub async fn force_save(&self) -> Result<SaveOutcome> {
        self.autosave.observe(self.document());
        Ok(self.autosave.force_save().await?)
    }

    pub async fn create_backup(&self, suffix: Option<&str>) -> Result<BackupRecord> {
        let document = self.document();
        let record = self.manager.create_backup(&document, suffix).await?;
        let _ = self.event_tx.send(SessionEvent::BackupCreated {
            key: record.key.clone(),
        });
        Ok(record)
    }

    /// Readable backups, newest first.
    pub async fn backups(&self) -> Result<Vec<BackupRecord>> {
        Ok(self.manager.get_backups().await?)
    }

    /// Replace the live document with a backup.
    ///
    /// History is cleared and the restored content is scheduled for saving.
    pub async fn restore_backup(&self, key: &str) -> Result<()> {
        let mut document = self.manager.restore_backup(key).await?;
        {
            let mut store = self.store.write();
            let live = store.document();
            document.version = live.version;
            document.last_modified = live.last_modified;
            store.replace_document(document.clone());
        }
        self.autosave.notify_change(document);
        let _ = self.event_tx.send(SessionEvent::Restored {
            key: key.to_string(),
        });
        Ok(())
    }

    /// Delete all but the `keep` newest backups.
    pub async fn prune_backups(&self, keep: usize) -> Result<Vec<String>> {
        Ok(self.manager.prune_backups(keep).await?)
    }

    pub fn autosave_status(&self) -> AutosaveStatus {
        self.autosave.status()
    }

    pub fn autosave_phase(&self) -> AutosavePhase {
        self.autosave.phase()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<AutosaveStatus> {
        self.autosave.subscribe_status()
    }

    /// Tear down: cancel any pending autosave. Unsaved changes are not flushed.
    pub fn close(&self) {
        self.autosave.shutdown();
        let _ = self.event_tx.send(SessionEvent::Closed);
        tracing::debug!(key = %self.config.storage_key, "Session closed");
    }
}
