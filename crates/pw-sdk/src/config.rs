//! Session and autosave configuration.

use pw_core::{Document, LanguageCode};
use pw_db::DEFAULT_MAX_HISTORY;
use pw_storage::{PersistError, DEFAULT_STORAGE_KEY};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default quiet period before an autosave fires.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_secs(30);

/// Called with the stored document after a successful save.
pub type SuccessCallback = Arc<dyn Fn(&Document) + Send + Sync>;

/// Called with the error after a failed save.
pub type ErrorCallback = Arc<dyn Fn(&PersistError) + Send + Sync>;

/// Configuration for the autosave controller.
#[derive(Clone)]
pub struct AutosaveConfig {
    /// Quiet period after the latest change.
    pub delay: Duration,
    /// Schedule saves on change. Manual saves work either way.
    pub enabled: bool,
    /// Post save notifications to the notifier.
    pub show_notifications: bool,
    pub on_success: Option<SuccessCallback>,
    pub on_error: Option<ErrorCallback>,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_AUTOSAVE_DELAY,
            enabled: true,
            show_notifications: true,
            on_success: None,
            on_error: None,
        }
    }
}

impl fmt::Debug for AutosaveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutosaveConfig")
            .field("delay", &self.delay)
            .field("enabled", &self.enabled)
            .field("show_notifications", &self.show_notifications)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Builder for autosave configuration.
pub struct AutosaveConfigBuilder {
    config: AutosaveConfig,
}

impl AutosaveConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AutosaveConfig::default(),
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.delay = delay;
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.config.delay = Duration::from_millis(ms);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn show_notifications(mut self, show: bool) -> Self {
        self.config.show_notifications = show;
        self
    }

    pub fn on_success(mut self, callback: impl Fn(&Document) + Send + Sync + 'static) -> Self {
        self.config.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&PersistError) + Send + Sync + 'static) -> Self {
        self.config.on_error = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> AutosaveConfig {
        self.config
    }
}

impl Default for AutosaveConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for an editing session.
#[derive(Clone, Debug)]
pub struct EditorConfig {
    /// Key of the primary document; backups derive their keys from it.
    pub storage_key: String,
    /// Languages given to a new document.
    pub languages: Vec<LanguageCode>,
    /// Fallback language of a new document.
    pub default_language: LanguageCode,
    /// Undo depth (0 = unbounded).
    pub max_history: usize,
    pub autosave: AutosaveConfig,
}

impl EditorConfig {
    /// The empty document a session starts from when nothing is stored.
    pub fn new_document(&self) -> Document {
        Document::new(self.languages.clone(), self.default_language.clone())
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            languages: vec![LanguageCode::default()],
            default_language: LanguageCode::default(),
            max_history: DEFAULT_MAX_HISTORY,
            autosave: AutosaveConfig::default(),
        }
    }
}

/// Builder for session configuration.
pub struct EditorConfigBuilder {
    config: EditorConfig,
}

impl EditorConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EditorConfig::default(),
        }
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.config.storage_key = key.into();
        self
    }

    pub fn languages<I, L>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<LanguageCode>,
    {
        self.config.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_language(mut self, language: impl Into<LanguageCode>) -> Self {
        self.config.default_language = language.into();
        self
    }

    pub fn max_history(mut self, depth: usize) -> Self {
        self.config.max_history = depth;
        self
    }

    pub fn autosave(mut self, autosave: AutosaveConfig) -> Self {
        self.config.autosave = autosave;
        self
    }

    pub fn build(self) -> EditorConfig {
        self.config
    }
}

impl Default for EditorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
