//! Keyboard command dispatch.
//!
//! A [`Keymap`] resolves key chords to editor [`Command`]s; [`dispatch`]
//! runs the command against a session and reports whether it had an effect,
//! posting the matching notification.

use crate::autosave::SaveOutcome;
use crate::notify::Notification;
use crate::session::EditorSession;
use pw_storage::StorageBackend;
use serde::{Deserialize, Serialize};

/// A physical key, independent of modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// A printable key, compared case-insensitively.
    Char(char),
    Delete,
    Backspace,
    Escape,
    Enter,
}

impl Key {
    fn normalized(self) -> Self {
        match self {
            Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }
}

/// A key plus modifier state.
///
/// Ctrl and Cmd (meta) are interchangeable as the primary modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl KeyChord {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Ctrl or Cmd is held.
    pub fn primary(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Editor commands reachable from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Undo,
    Redo,
    Save,
    DuplicateSelected,
    RemoveSelected,
    ClearSelection,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Binding {
    key: Key,
    primary: bool,
    shift: bool,
    command: Command,
}

/// Chord-to-command table.
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: Vec<Binding>,
}

impl Keymap {
    /// A keymap with no bindings.
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Bind a chord, replacing any binding for the same chord.
    pub fn bind(&mut self, chord: KeyChord, command: Command) -> &mut Self {
        let binding = Binding {
            key: chord.key.normalized(),
            primary: chord.primary(),
            shift: chord.shift,
            command,
        };
        self.bindings.retain(|b| {
            !(b.key == binding.key && b.primary == binding.primary && b.shift == binding.shift)
        });
        self.bindings.push(binding);
        self
    }

    /// The command bound to `chord`, if any.
    pub fn resolve(&self, chord: &KeyChord) -> Option<Command> {
        let key = chord.key.normalized();
        self.bindings
            .iter()
            .find(|b| b.key == key && b.primary == chord.primary() && b.shift == chord.shift)
            .map(|b| b.command)
    }
}

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Self::empty();
        keymap
            .bind(KeyChord::new(Key::Char('z')).ctrl(), Command::Undo)
            .bind(KeyChord::new(Key::Char('z')).ctrl().shift(), Command::Redo)
            .bind(KeyChord::new(Key::Char('s')).ctrl(), Command::Save)
            .bind(KeyChord::new(Key::Char('d')).ctrl(), Command::DuplicateSelected)
            .bind(KeyChord::new(Key::Delete), Command::RemoveSelected)
            .bind(KeyChord::new(Key::Backspace), Command::RemoveSelected)
            .bind(KeyChord::new(Key::Escape), Command::ClearSelection);
        keymap
    }
}

/// What a dispatched chord did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No command is bound to the chord.
    Unbound,
    /// The command changed something.
    Applied {
        command: Command,
        message: Option<&'static str>,
    },
    /// The command ran but had nothing to act on.
    Noop {
        command: Command,
        message: &'static str,
    },
    /// The command failed.
    Failed { command: Command, error: String },
}

impl DispatchOutcome {
    pub fn command(&self) -> Option<Command> {
        match self {
            DispatchOutcome::Unbound => None,
            DispatchOutcome::Applied { command, .. }
            | DispatchOutcome::Noop { command, .. }
            | DispatchOutcome::Failed { command, .. } => Some(*command),
        }
    }

    /// User-facing text, if the outcome has any.
    pub fn message(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Unbound => None,
            DispatchOutcome::Applied { message, .. } => *message,
            DispatchOutcome::Noop { message, .. } => Some(*message),
            DispatchOutcome::Failed { .. } => Some("Save failed"),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied { .. })
    }
}

/// Resolve `chord` through `keymap` and run the command on `session`.
pub async fn dispatch<S: StorageBackend>(
    session: &EditorSession<S>,
    keymap: &Keymap,
    chord: KeyChord,
) -> DispatchOutcome {
    let Some(command) = keymap.resolve(&chord) else {
        return DispatchOutcome::Unbound;
    };
    tracing::debug!(?command, "Dispatching command");
    execute(session, command).await
}

/// Run a command on `session` directly.
pub async fn execute<S: StorageBackend>(
    session: &EditorSession<S>,
    command: Command,
) -> DispatchOutcome {
    let outcome = match command {
        Command::Undo => toggle(command, session.undo(), "Undone", "Nothing to undo"),
        Command::Redo => toggle(command, session.redo(), "Redone", "Nothing to redo"),
        Command::Save => {
            return match session.save().await {
                // The autosave controller posts save notifications itself.
                Ok(SaveOutcome::Saved(_)) | Ok(SaveOutcome::Unchanged) => {
                    DispatchOutcome::Applied {
                        command,
                        message: Some("Saved"),
                    }
                }
                Ok(SaveOutcome::NothingToSave) => DispatchOutcome::Noop {
                    command,
                    message: "Nothing to save",
                },
                Err(e) => DispatchOutcome::Failed {
                    command,
                    error: e.to_string(),
                },
            };
        }
        Command::DuplicateSelected => match session.selected_block_id() {
            Some(id) => match session.duplicate_block(&id) {
                Some(copy) => {
                    session.set_selection(Some(copy));
                    DispatchOutcome::Applied {
                        command,
                        message: Some("Block duplicated"),
                    }
                }
                None => no_selection(command),
            },
            None => no_selection(command),
        },
        Command::RemoveSelected => match session.selected_block_id() {
            Some(id) if session.remove_block(&id) => DispatchOutcome::Applied {
                command,
                message: Some("Block removed"),
            },
            _ => no_selection(command),
        },
        Command::ClearSelection => {
            session.set_selection(None);
            DispatchOutcome::Applied {
                command,
                message: None,
            }
        }
    };

    match &outcome {
        DispatchOutcome::Applied {
            message: Some(message),
            ..
        } => session.notify(Notification::success(*message)),
        DispatchOutcome::Noop { message, .. } => session.notify(Notification::info(*message)),
        _ => {}
    }
    outcome
}

fn toggle(
    command: Command,
    applied: bool,
    done: &'static str,
    nothing: &'static str,
) -> DispatchOutcome {
    if applied {
        DispatchOutcome::Applied {
            command,
            message: Some(done),
        }
    } else {
        DispatchOutcome::Noop {
            command,
            message: nothing,
        }
    }
}

fn no_selection(command: Command) -> DispatchOutcome {
    DispatchOutcome::Noop {
        command,
        message: "No block selected",
    }
}
