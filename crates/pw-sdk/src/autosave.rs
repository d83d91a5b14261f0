//! Autosave Controller - debounced, change-aware saving.
//!
//! Every observed change restarts a single timer (trailing-edge debounce);
//! when it fires, the most recent document is saved unless its canonical
//! serialization matches the last successful save. The controller keeps its
//! own single-flight guard on top of the save manager's.
//!
//! Status (`is_saving`, `last_saved`, `save_error`) is published through a
//! `watch` channel because a change and the save it eventually causes are
//! decoupled in time.

use crate::config::AutosaveConfig;
use crate::error::AutosaveError;
use crate::notify::{Notification, Notifier};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pw_core::Document;
use pw_storage::{PersistError, SaveManager, StorageBackend};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Where the controller is in its save cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutosavePhase {
    Idle,
    /// A timer is pending.
    Scheduled,
    /// A save started by the controller is running.
    Saving,
}

/// Observable save status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AutosaveStatus {
    pub is_saving: bool,
    pub last_saved: Option<DateTime<Utc>>,
    pub save_error: Option<String>,
}

/// Result of a save request that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum SaveOutcome {
    /// Written to storage; carries the stored document.
    Saved(Document),
    /// Content matches the last save, nothing written.
    Unchanged,
    /// No document has been observed yet.
    NothingToSave,
}

/// Invoked with the stored document after every successful save.
pub type SavedHook = Arc<dyn Fn(&Document) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Trigger {
    Scheduled,
    Manual,
    Forced,
}

struct State {
    latest: Option<Document>,
    last_saved_json: Option<String>,
    pending: Option<JoinHandle<()>>,
    generation: u64,
}

/// Holds the controller flag. Only an owning guard clears it on drop.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
    owned: bool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.owned {
            self.flag.store(false, Ordering::Release);
        }
    }
}

struct Inner<S: StorageBackend> {
    manager: Arc<SaveManager<S>>,
    config: AutosaveConfig,
    notifier: Option<Arc<dyn Notifier>>,
    saved_hook: Mutex<Option<SavedHook>>,
    state: Mutex<State>,
    saving: AtomicBool,
    status_tx: watch::Sender<AutosaveStatus>,
}

impl<S: StorageBackend> Inner<S> {
    /// Arm a fresh timer. Caller holds the state lock.
    fn schedule(self: &Arc<Self>, state: &mut State) {
        if let Some(handle) = state.pending.take() {
            handle.abort();
        }
        if !self.config.enabled {
            tracing::debug!("Autosave disabled, change recorded only");
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("No async runtime, autosave not scheduled");
            return;
        };

        state.generation += 1;
        let generation = state.generation;
        let delay = self.config.delay;
        let inner = Arc::clone(self);
        state.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            inner.fire(generation).await;
        }));

        tracing::debug!(delay_ms = delay.as_millis() as u64, "Autosave scheduled");
    }

    async fn fire(self: Arc<Self>, generation: u64) {
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            state.pending = None;

            if self.saving.load(Ordering::Acquire) {
                tracing::debug!("Autosave deferred, a save is still running");
                self.schedule(&mut state);
                return;
            }
        }

        if let Err(e) = self.run(Trigger::Scheduled).await {
            tracing::debug!(error = %e, "Scheduled save did not complete");
        }
    }

    async fn run(&self, trigger: Trigger) -> Result<SaveOutcome, AutosaveError> {
        let mut busy = self.acquire(trigger)?;

        let (document, last_saved_json) = {
            let state = self.state.lock();
            (state.latest.clone(), state.last_saved_json.clone())
        };
        let Some(document) = document else {
            return Ok(SaveOutcome::NothingToSave);
        };

        let json = document
            .canonical_json()
            .map_err(|e| PersistError::Storage(e.to_string()))?;
        if trigger != Trigger::Forced && last_saved_json.as_deref() == Some(json.as_str()) {
            tracing::debug!(?trigger, "No changes since last save, skipping");
            return Ok(SaveOutcome::Unchanged);
        }

        if busy.owned {
            self.status_tx.send_modify(|s| s.is_saving = true);
        }

        match self.manager.save(&document).await {
            Ok(stored) => {
                // A completed write supersedes a flag left by another save.
                busy.owned = true;
                self.record_success(&stored, json);
                if trigger == Trigger::Scheduled {
                    self.post(Notification::success("Auto-saved"));
                } else {
                    self.post(Notification::success("Saved"));
                }
                Ok(SaveOutcome::Saved(stored))
            }
            Err(e) if !busy.owned => {
                // Another controller save holds the flag and owns the status.
                tracing::warn!(?trigger, error = %e, "Forced save rejected while a save is running");
                Err(e.into())
            }
            Err(e) => {
                tracing::warn!(?trigger, error = %e, "Save failed");
                self.status_tx.send_modify(|s| {
                    s.is_saving = false;
                    s.save_error = Some(e.to_string());
                });
                if let Some(on_error) = &self.config.on_error {
                    on_error(&e);
                }
                self.post(Notification::error("Save failed"));
                Err(e.into())
            }
        }
    }

    fn acquire(&self, trigger: Trigger) -> Result<BusyGuard<'_>, AutosaveError> {
        let owned = if trigger == Trigger::Forced {
            !self.saving.swap(true, Ordering::AcqRel)
        } else {
            self.saving
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .map_err(|_| AutosaveError::Busy)?;
            true
        };
        Ok(BusyGuard {
            flag: &self.saving,
            owned,
        })
    }

    fn record_success(&self, stored: &Document, json: String) {
        {
            let mut state = self.state.lock();
            state.last_saved_json = Some(json);
            if let Some(latest) = state.latest.as_mut() {
                latest.version = latest.version.max(stored.version);
                latest.last_modified = stored.last_modified;
            }
        }

        self.status_tx.send_modify(|s| {
            s.is_saving = false;
            s.last_saved = stored.last_modified;
            s.save_error = None;
        });

        let hook = self.saved_hook.lock().clone();
        if let Some(hook) = hook {
            hook(stored);
        }
        if let Some(on_success) = &self.config.on_success {
            on_success(stored);
        }
    }

    fn post(&self, notification: Notification) {
        if !self.config.show_notifications {
            return;
        }
        if let Some(notifier) = &self.notifier {
            notifier.notify(notification);
        }
    }
}

/// Debounced autosave over a shared save manager.
///
/// Scheduling needs a tokio runtime; outside one, changes are still
/// recorded and manual saves work.
pub struct AutosaveController<S: StorageBackend> {
    inner: Arc<Inner<S>>,
}

impl<S: StorageBackend> AutosaveController<S> {
    pub fn new(
        manager: Arc<SaveManager<S>>,
        config: AutosaveConfig,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let (status_tx, _) = watch::channel(AutosaveStatus::default());
        Self {
            inner: Arc::new(Inner {
                manager,
                config,
                notifier,
                saved_hook: Mutex::new(None),
                state: Mutex::new(State {
                    latest: None,
                    last_saved_json: None,
                    pending: None,
                    generation: 0,
                }),
                saving: AtomicBool::new(false),
                status_tx,
            }),
        }
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.inner.config
    }

    pub fn manager(&self) -> &Arc<SaveManager<S>> {
        &self.inner.manager
    }

    /// Install the hook run after each successful save.
    pub fn set_saved_hook(&self, hook: SavedHook) {
        *self.inner.saved_hook.lock() = Some(hook);
    }

    pub fn phase(&self) -> AutosavePhase {
        if self.inner.saving.load(Ordering::Acquire) {
            AutosavePhase::Saving
        } else if self.inner.state.lock().pending.is_some() {
            AutosavePhase::Scheduled
        } else {
            AutosavePhase::Idle
        }
    }

    /// Whether a save started by the controller is running.
    pub fn is_saving(&self) -> bool {
        self.inner.saving.load(Ordering::Acquire)
    }

    pub fn status(&self) -> AutosaveStatus {
        self.inner.status_tx.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<AutosaveStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Record the latest document without touching the timer.
    pub fn observe(&self, document: Document) {
        self.inner.state.lock().latest = Some(document);
    }

    /// Record a change and restart the debounce timer.
    pub fn notify_change(&self, document: Document) {
        let mut state = self.inner.state.lock();
        state.latest = Some(document);
        self.inner.schedule(&mut state);
    }

    /// Treat `document` as already saved (e.g. right after loading it).
    pub fn mark_saved_baseline(&self, document: &Document) {
        let json = document.canonical_json().ok();
        {
            let mut state = self.inner.state.lock();
            state.last_saved_json = json;
            state.latest = Some(document.clone());
        }
        self.inner
            .status_tx
            .send_modify(|s| s.last_saved = document.last_modified);
    }

    /// Whether `document` differs from the last successful save.
    pub fn has_unsaved_changes(&self, document: &Document) -> bool {
        let state = self.inner.state.lock();
        match (&state.last_saved_json, document.canonical_json()) {
            (Some(saved), Ok(current)) => *saved != current,
            _ => true,
        }
    }

    /// Save now, unless nothing changed or a controller save is running.
    pub async fn save(&self) -> Result<SaveOutcome, AutosaveError> {
        self.cancel_pending();
        self.inner.run(Trigger::Manual).await
    }

    /// Save now regardless of the change check and the controller guard.
    ///
    /// The save manager still rejects an overlapping write with
    /// `SaveInProgress`.
    pub async fn force_save(&self) -> Result<SaveOutcome, AutosaveError> {
        self.cancel_pending();
        self.inner.run(Trigger::Forced).await
    }

    /// Cancel the pending timer. An in-flight save runs to completion.
    pub fn shutdown(&self) {
        if self.cancel_pending() {
            tracing::debug!("Autosave timer cancelled on shutdown");
        }
    }

    fn cancel_pending(&self) -> bool {
        match self.inner.state.lock().pending.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl<S: StorageBackend> Drop for AutosaveController<S> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AutosaveConfigBuilder;
    use pw_core::{Block, BlockType};
    use pw_storage::MemoryStorage;
    use std::time::Duration;

    fn controller(config: AutosaveConfig) -> AutosaveController<Arc<MemoryStorage>> {
        let manager = Arc::new(SaveManager::new(Arc::new(MemoryStorage::new()), "page"));
        AutosaveController::new(manager, config, None)
    }

    fn doc_with(block_type: BlockType) -> Document {
        let mut doc = Document::default();
        let block = Block::new(block_type, &doc.languages, &doc.default_language);
        doc.blocks.push(block);
        doc
    }

    fn writes(controller: &AutosaveController<Arc<MemoryStorage>>) -> usize {
        controller.manager().storage().write_count()
    }

    #[tokio::test]
    async fn test_force_save_ignores_stuck_guard() {
        let controller = controller(AutosaveConfig::default());
        controller.observe(doc_with(BlockType::Hero));
        controller.inner.saving.store(true, Ordering::Release);

        assert_eq!(controller.save().await, Err(AutosaveError::Busy));
        assert_eq!(controller.phase(), AutosavePhase::Saving);

        let outcome = controller.force_save().await.unwrap();
        assert!(matches!(outcome, SaveOutcome::Saved(ref d) if d.version == 1));
        assert!(!controller.is_saving());
        assert_eq!(writes(&controller), 1);
    }

    #[tokio::test]
    async fn test_manual_save_skips_unchanged() {
        let controller = controller(AutosaveConfig::default());
        controller.observe(doc_with(BlockType::Hero));

        assert!(matches!(controller.save().await, Ok(SaveOutcome::Saved(_))));
        assert_eq!(controller.save().await, Ok(SaveOutcome::Unchanged));
        assert_eq!(writes(&controller), 1);

        assert!(matches!(controller.force_save().await, Ok(SaveOutcome::Saved(ref d)) if d.version == 2));
        assert_eq!(writes(&controller), 2);
    }

    #[tokio::test]
    async fn test_nothing_observed() {
        let controller = controller(AutosaveConfig::default());
        assert_eq!(controller.save().await, Ok(SaveOutcome::NothingToSave));
        assert_eq!(writes(&controller), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_never_schedules() {
        let controller = controller(AutosaveConfigBuilder::new().enabled(false).build());
        controller.notify_change(doc_with(BlockType::Team));

        assert_eq!(controller.phase(), AutosavePhase::Idle);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(writes(&controller), 0);

        assert!(matches!(controller.save().await, Ok(SaveOutcome::Saved(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_timer() {
        let controller = controller(AutosaveConfigBuilder::new().delay_ms(1000).build());
        controller.notify_change(doc_with(BlockType::Team));
        assert_eq!(controller.phase(), AutosavePhase::Scheduled);

        controller.shutdown();
        assert_eq!(controller.phase(), AutosavePhase::Idle);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(writes(&controller), 0);
    }

    #[tokio::test]
    async fn test_baseline_suppresses_first_save() {
        let controller = controller(AutosaveConfig::default());
        let doc = doc_with(BlockType::Pricing);
        controller.mark_saved_baseline(&doc);

        assert!(!controller.has_unsaved_changes(&doc));
        assert_eq!(controller.save().await, Ok(SaveOutcome::Unchanged));
        assert!(controller.has_unsaved_changes(&doc_with(BlockType::About)));
    }
}
