//! Session-level scenarios: debounced autosave, keyboard commands,
//! backups and failure reporting.

use async_trait::async_trait;
use pw_sdk::prelude::*;
use pw_sdk::{AutosaveError, SaveOutcome};
use pw_storage::{MemoryStorage, PersistError, StorageBackend, StorageError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

fn config_with_delay(ms: u64) -> EditorConfig {
    EditorConfigBuilder::new()
        .autosave(AutosaveConfigBuilder::new().delay_ms(ms).build())
        .build()
}

async fn open(storage: &Arc<MemoryStorage>, config: EditorConfig) -> EditorSession<Arc<MemoryStorage>> {
    EditorSession::open(storage.clone(), config).await.unwrap()
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Notification>) -> Vec<String> {
    let mut messages = Vec::new();
    while let Ok(n) = rx.try_recv() {
        messages.push(n.message);
    }
    messages
}

/// Storage that fails every write.
struct BrokenStorage;

#[async_trait]
impl StorageBackend for BrokenStorage {
    async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String) -> Result<(), StorageError> {
        Err(StorageError::Backend("disk full".to_string()))
    }

    async fn keys_with_prefix(&self, _prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(Vec::new())
    }

    async fn remove(&self, _key: &str) -> Result<bool, StorageError> {
        Ok(false)
    }
}

/// Storage whose writes each wait for a permit from the test.
struct GatedStorage {
    inner: MemoryStorage,
    gate: Semaphore,
}

impl GatedStorage {
    fn closed() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStorage::new(),
            gate: Semaphore::new(0),
        })
    }
}

#[async_trait]
impl StorageBackend for GatedStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        permit.forget();
        self.inner.set(key, value).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.inner.keys_with_prefix(prefix).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.inner.remove(key).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_debounce_saves_once_after_last_change() {
    let storage = Arc::new(MemoryStorage::new());
    let session = open(&storage, config_with_delay(30_000)).await;

    // t = 0
    let hero = session.add_block(BlockType::Hero, None);
    assert_eq!(session.autosave_phase(), AutosavePhase::Scheduled);

    // t = 10000
    tokio::time::sleep(Duration::from_millis(10_000)).await;
    session.update_block(&hero, BlockUpdate::new().with_field("title", "Spring sale"));

    // t = 39999
    tokio::time::sleep(Duration::from_millis(29_999)).await;
    assert_eq!(storage.write_count(), 0);

    // t = 40001
    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(storage.write_count(), 1);
    assert_eq!(session.autosave_phase(), AutosavePhase::Idle);

    let status = session.autosave_status();
    assert!(!status.is_saving);
    assert!(status.last_saved.is_some());
    assert!(status.save_error.is_none());

    // The stored copy is the latest document and its stamps flow back.
    let stored = session.save_manager().load().await.unwrap();
    assert_eq!(stored.blocks, session.document().blocks);
    assert_eq!(session.document().version, 1);
    assert!(!session.has_unsaved_changes());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(storage.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_document_is_written_at_most_once() {
    let storage = Arc::new(MemoryStorage::new());
    let session = open(&storage, config_with_delay(1_000)).await;

    let block = session.add_block(BlockType::About, None);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(storage.write_count(), 1);

    // Edit and revert: the content matches the last save again.
    session.update_block(&block, BlockUpdate::new().with_field("title", "Draft"));
    session.update_block(&block, BlockUpdate::new().with_field("title", "About us"));
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(storage.write_count(), 1);
    assert_eq!(session.save().await, Ok(SaveOutcome::Unchanged));
    assert_eq!(storage.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_view_changes_do_not_schedule_saves() {
    let storage = Arc::new(MemoryStorage::new());
    let session = open(&storage, config_with_delay(1_000)).await;
    let block = session.add_block(BlockType::Team, None);
    tokio::time::sleep(Duration::from_secs(2)).await;

    session.set_selection(Some(block));
    session.set_current_language("de");
    assert_eq!(session.autosave_phase(), AutosavePhase::Idle);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(storage.write_count(), 1);
}

#[tokio::test]
async fn test_open_empty_then_save_then_reopen() {
    let storage = Arc::new(MemoryStorage::new());

    let session = open(&storage, EditorConfig::default()).await;
    assert!(session.is_empty());
    assert!(matches!(
        session.save_manager().load().await,
        Err(PersistError::NotFound(_))
    ));

    session.add_block(BlockType::Pricing, None);
    session.add_block(BlockType::Gallery, Some(0));
    let saved = match session.save().await.unwrap() {
        SaveOutcome::Saved(doc) => doc,
        other => panic!("expected a save, got {:?}", other),
    };
    session.close();

    let reopened = open(&storage, EditorConfig::default()).await;
    let doc = reopened.document();
    assert_eq!(doc.blocks, saved.blocks);
    assert_eq!(doc.version, 1);
    assert_eq!(doc.last_modified, saved.last_modified);
    assert!(!reopened.has_unsaved_changes());
    assert!(!reopened.can_undo());
}

#[tokio::test]
async fn test_open_rejects_malformed_document() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set("pagewright_document", "not json".to_string())
        .await
        .unwrap();

    let result = EditorSession::open(storage, EditorConfig::default()).await;
    assert!(matches!(
        result,
        Err(SdkError::Persist(PersistError::Storage(_)))
    ));
}

#[tokio::test]
async fn test_keyboard_remove_undo_redo() {
    let notifier = Arc::new(BroadcastNotifier::default());
    let mut notes = notifier.subscribe();
    let session = EditorSession::open_with_notifier(
        Arc::new(MemoryStorage::new()),
        EditorConfig::default(),
        Some(notifier.clone()),
    )
    .await
    .unwrap();
    let keymap = Keymap::default();

    let a = session.add_block(BlockType::Hero, None);
    let b = session.add_block(BlockType::Features, None);
    let c = session.add_block(BlockType::ContactForm, None);
    session.set_selection(Some(b.clone()));

    let removed = dispatch(&session, &keymap, KeyChord::new(Key::Delete)).await;
    assert_eq!(removed.message(), Some("Block removed"));
    assert_eq!(session.block_ids(), vec![a.clone(), c.clone()]);
    assert_eq!(session.selected_block_id(), None);

    let undone = dispatch(&session, &keymap, KeyChord::new(Key::Char('z')).ctrl()).await;
    assert!(undone.is_applied());
    assert_eq!(session.block_ids(), vec![a.clone(), b.clone(), c.clone()]);
    assert_eq!(session.selected_block_id(), Some(b));

    let redone = dispatch(
        &session,
        &keymap,
        KeyChord::new(Key::Char('z')).meta().shift(),
    )
    .await;
    assert!(redone.is_applied());
    assert_eq!(session.block_ids(), vec![a, c]);

    let again = dispatch(&session, &keymap, KeyChord::new(Key::Char('z')).shift().ctrl()).await;
    assert_eq!(again.message(), Some("Nothing to redo"));

    assert_eq!(
        drain(&mut notes),
        vec!["Block removed", "Undone", "Redone", "Nothing to redo"]
    );
}

#[tokio::test]
async fn test_keyboard_duplicate_and_escape() {
    let session = open(&Arc::new(MemoryStorage::new()), EditorConfig::default()).await;
    let keymap = Keymap::default();

    let nothing = dispatch(&session, &keymap, KeyChord::new(Key::Char('d')).ctrl()).await;
    assert!(matches!(nothing, DispatchOutcome::Noop { .. }));

    let first = session.add_block(BlockType::Testimonials, None);
    session.add_block(BlockType::LogoCloud, None);
    session.set_selection(Some(first.clone()));

    let duplicated = dispatch(&session, &keymap, KeyChord::new(Key::Char('D')).meta()).await;
    assert_eq!(duplicated.message(), Some("Block duplicated"));
    let copy = session.selected_block_id().unwrap();
    assert_ne!(copy, first);
    assert_eq!(session.block_ids()[1], copy);

    let cleared = dispatch(&session, &keymap, KeyChord::new(Key::Escape)).await;
    assert_eq!(cleared.command(), Some(Command::ClearSelection));
    assert_eq!(session.selected_block_id(), None);

    let unbound = dispatch(&session, &keymap, KeyChord::new(Key::Enter)).await;
    assert_eq!(unbound, DispatchOutcome::Unbound);
}

#[tokio::test]
async fn test_save_failure_is_reported_not_fatal() {
    let failures = Arc::new(AtomicUsize::new(0));
    let notifier = Arc::new(BroadcastNotifier::default());
    let mut notes = notifier.subscribe();

    let config = {
        let failures = failures.clone();
        EditorConfigBuilder::new()
            .autosave(
                AutosaveConfigBuilder::new()
                    .on_error(move |_| {
                        failures.fetch_add(1, Ordering::SeqCst);
                    })
                    .build(),
            )
            .build()
    };
    let session = EditorSession::open_with_notifier(BrokenStorage, config, Some(notifier.clone()))
        .await
        .unwrap();

    session.add_block(BlockType::ProductGrid, None);
    let result = session.save().await;

    assert!(matches!(
        result,
        Err(SdkError::Autosave(AutosaveError::Persist(PersistError::Storage(_))))
    ));
    assert_eq!(failures.load(Ordering::SeqCst), 1);
    assert!(session.autosave_status().save_error.is_some());
    assert_eq!(drain(&mut notes), vec!["Save failed"]);

    // Editing continues after the failure.
    assert!(session.undo());
    assert!(session.is_empty());
    assert!(session.has_unsaved_changes());
}

#[tokio::test]
async fn test_success_callback_and_saved_events() {
    let saves = Arc::new(AtomicUsize::new(0));
    let config = {
        let saves = saves.clone();
        EditorConfigBuilder::new()
            .autosave(
                AutosaveConfigBuilder::new()
                    .on_success(move |_| {
                        saves.fetch_add(1, Ordering::SeqCst);
                    })
                    .build(),
            )
            .build()
    };
    let session = EditorSession::open(Arc::new(MemoryStorage::new()), config)
        .await
        .unwrap();
    let mut events = session.subscribe();

    session.add_block(BlockType::Hero, None);
    session.force_save().await.unwrap();
    session.force_save().await.unwrap();

    assert_eq!(saves.load(Ordering::SeqCst), 2);
    assert_eq!(session.document().version, 2);

    let mut saved_versions = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Saved { version } = event {
            saved_versions.push(version);
        }
    }
    assert_eq!(saved_versions, vec![1, 2]);
}

#[tokio::test]
async fn test_backup_and_restore() {
    let storage = Arc::new(MemoryStorage::new());
    let session = open(&storage, EditorConfig::default()).await;

    session.add_block(BlockType::Hero, None);
    session.add_block(BlockType::CallToAction, None);
    let record = session.create_backup(Some("before-edit")).await.unwrap();
    assert_eq!(record.key, "pagewright_document_backup_before-edit");

    let ids = session.block_ids();
    session.remove_block(&ids[0]);
    session.remove_block(&ids[1]);
    assert!(session.is_empty());

    let backups = session.backups().await.unwrap();
    assert_eq!(backups.len(), 1);

    let mut events = session.subscribe();
    session.restore_backup(&backups[0].key).await.unwrap();
    assert_eq!(session.block_ids(), ids);
    assert!(!session.can_undo());
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::Restored {
            key: record.key.clone()
        }
    );

    assert!(session.restore_backup("pagewright_document_backup_missing").await.is_err());
    assert_eq!(session.prune_backups(0).await.unwrap(), vec![record.key]);
}

#[tokio::test(start_paused = true)]
async fn test_force_save_during_scheduled_save_keeps_status() {
    let storage = GatedStorage::closed();
    let failures = Arc::new(AtomicUsize::new(0));
    let notifier = Arc::new(BroadcastNotifier::default());
    let mut notes = notifier.subscribe();

    let config = {
        let failures = failures.clone();
        EditorConfigBuilder::new()
            .autosave(
                AutosaveConfigBuilder::new()
                    .delay_ms(10)
                    .on_error(move |_| {
                        failures.fetch_add(1, Ordering::SeqCst);
                    })
                    .build(),
            )
            .build()
    };
    let session = EditorSession::open_with_notifier(storage.clone(), config, Some(notifier.clone()))
        .await
        .unwrap();

    session.add_block(BlockType::Hero, None);
    tokio::time::sleep(Duration::from_millis(15)).await;
    assert_eq!(session.autosave_phase(), AutosavePhase::Saving);

    let forced = session.force_save().await;
    assert_eq!(
        forced,
        Err(SdkError::Autosave(AutosaveError::Persist(
            PersistError::SaveInProgress
        )))
    );

    // The scheduled save is still writing and still owns the status.
    assert_eq!(session.autosave_phase(), AutosavePhase::Saving);
    let status = session.autosave_status();
    assert!(status.is_saving);
    assert!(status.save_error.is_none());
    assert_eq!(failures.load(Ordering::SeqCst), 0);
    assert!(drain(&mut notes).is_empty());

    storage.gate.add_permits(1);
    tokio::time::sleep(Duration::from_millis(5)).await;

    assert_eq!(storage.inner.write_count(), 1);
    assert_eq!(session.autosave_phase(), AutosavePhase::Idle);
    let status = session.autosave_status();
    assert!(!status.is_saving);
    assert!(status.last_saved.is_some());
    assert!(status.save_error.is_none());
    assert_eq!(drain(&mut notes), vec!["Auto-saved"]);
}

#[tokio::test(start_paused = true)]
async fn test_edit_during_save_is_saved_afterwards() {
    let storage = GatedStorage::closed();
    let session = EditorSession::open(storage.clone(), config_with_delay(10))
        .await
        .unwrap();

    let hero = session.add_block(BlockType::Hero, None);
    tokio::time::sleep(Duration::from_millis(15)).await;
    assert_eq!(session.autosave_phase(), AutosavePhase::Saving);

    // The timer for this edit fires while the first save is blocked.
    session.update_block(&hero, BlockUpdate::new().with_field("title", "Launch week"));
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(storage.inner.write_count(), 0);
    assert_eq!(session.autosave_phase(), AutosavePhase::Saving);

    storage.gate.add_permits(2);
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(storage.inner.write_count(), 2);
    let stored = session.save_manager().load().await.unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.blocks, session.document().blocks);
    assert_eq!(
        stored.blocks[0].content.get_exact(&stored.default_language).unwrap()["title"],
        "Launch week"
    );
    assert_eq!(session.document().version, 2);
    assert!(!session.has_unsaved_changes());
}
