//! # Pagewright CLI
//!
//! A small command-line page editor built on the Pagewright SDK.
//!
//! Persistent commands operate on a directory-backed store (`--dir`, default
//! `.pagewright`): each run opens the page, applies one edit and saves it.
//! `demo` and `undo-demo` run entirely in memory.
//!
//! ## Storage layout
//!
//! ```text
//! .pagewright/pagewright_document.json            →  the page
//! .pagewright/pagewright_document_backup_<s>.json →  backups
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::*;
use pw_sdk::prelude::*;
use pw_sdk::{LanguageCode, NotificationLevel, SaveOutcome};
use pw_storage::{FileStorage, MemoryStorage, StorageBackend};
use serde_json::Value;

// ─── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "pagewright")]
#[command(about = "Block-based page editor with undo/redo, autosave and backups")]
#[command(version)]
struct Cli {
    /// Directory holding the page and its backups
    #[arg(long, global = true, default_value = ".pagewright")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// In-memory walkthrough: build a page, edit in two languages, autosave
    Demo,
    /// Print the stored page
    Show {
        /// Language to render (defaults to the page's default language)
        #[arg(long)]
        lang: Option<String>,
    },
    /// Add a block (hero, features, call-to-action, ...)
    Add {
        block_type: BlockType,
        /// Insert position (appends when omitted)
        #[arg(long)]
        at: Option<usize>,
    },
    /// Remove the block at an index
    Remove { index: usize },
    /// Duplicate the block at an index
    Duplicate { index: usize },
    /// Move the block at an index to a new position
    Move { index: usize, to: usize },
    /// Set a content field (or a setting with --setting) on a block
    Set {
        index: usize,
        key: String,
        /// JSON value; plain text is stored as a string
        value: String,
        /// Content language to edit
        #[arg(long)]
        lang: Option<String>,
        /// Write to the block settings instead of its content
        #[arg(long)]
        setting: bool,
    },
    /// In-memory undo/redo scenario with keyboard commands
    UndoDemo,
    /// Back up the stored page
    Backup {
        #[arg(long)]
        suffix: Option<String>,
    },
    /// List backups, newest first
    Backups,
    /// Replace the page with a backup
    Restore { key: String },
    /// Delete all but the newest backups
    Prune {
        #[arg(long, default_value_t = 5)]
        keep: usize,
    },
}

// ─── Pretty printing ──────────────────────────────────────────────────────

fn header(text: &str) {
    let bar = "═".repeat(60);
    println!("\n{}", bar.bright_cyan());
    println!("  {}", text.bold().bright_white());
    println!("{}", bar.bright_cyan());
}

fn section(text: &str) {
    println!("\n{} {}", "▸".bright_yellow(), text.bold());
}

fn step(text: &str) {
    println!("  {} {}", "•".bright_green(), text);
}

fn ok(text: &str) {
    println!("  {} {}", "✓".bright_green().bold(), text);
}

/// Last six characters of a block id.
fn short_id(id: &BlockId) -> String {
    let s = id.as_str();
    let start = s
        .char_indices()
        .rev()
        .nth(5)
        .map(|(i, _)| i)
        .unwrap_or(0);
    s[start..].to_string()
}

fn show_document(doc: &Document) {
    let border = "─".repeat(56);
    println!("  ┌{}┐", border);
    let title = format!(
        "Page v{} [{}]  languages: {}",
        doc.version,
        doc.current_language,
        doc.languages
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  │ {:<54} │", title.bright_yellow().to_string());
    println!("  ├{}┤", border);

    if doc.is_empty() {
        println!("  │ {:^54} │", "(no blocks)".dimmed().to_string());
    }
    for (index, block) in doc.blocks.iter().enumerate() {
        let selected = doc.selected_block_id.as_ref() == Some(block.id());
        let marker = if selected { "▶" } else { " " };
        let heading = block
            .content
            .get(&doc.current_language)
            .and_then(|c| c.get("title"))
            .and_then(Value::as_str)
            .unwrap_or("");
        let line = format!(
            "{} {:>2}  {:<15} {:<22} {}",
            marker,
            index,
            block.block_type.label(),
            heading,
            short_id(block.id()).dimmed()
        );
        println!("  │ {:<54} │", line);
    }
    println!("  └{}┘", border);
}

fn print_dispatch(outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Applied { message, .. } => {
            ok(message.unwrap_or("Done"));
        }
        DispatchOutcome::Noop { message, .. } => {
            println!("  {} {}", "–".bright_yellow(), message);
        }
        DispatchOutcome::Failed { error, .. } => {
            println!("  {} {}", "✗".bright_red().bold(), error);
        }
        DispatchOutcome::Unbound => println!("  {} unbound key", "?".bright_yellow()),
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

// ─── In-memory demos ──────────────────────────────────────────────────────

async fn run_demo() -> pw_sdk::Result<()> {
    header("DEMO — Building a page");

    let notifier = Arc::new(BroadcastNotifier::default());
    let mut notes = notifier.subscribe();
    let config = EditorConfigBuilder::new()
        .languages(["en", "es"])
        .default_language("en")
        .autosave(AutosaveConfigBuilder::new().delay_ms(200).build())
        .build();
    let storage = Arc::new(MemoryStorage::new());
    let session =
        EditorSession::open_with_notifier(storage.clone(), config, Some(notifier.clone())).await?;

    section("Phase 1: Add blocks");
    let hero = session.add_block(BlockType::Hero, None);
    step("added hero");
    let features = session.add_block(BlockType::Features, None);
    step("added features");
    session.add_block(BlockType::CallToAction, None);
    step("added call-to-action");
    show_document(&session.document());

    section("Phase 2: Edit in two languages");
    session.update_block(&hero, BlockUpdate::new().with_field("title", "Spring collection"));
    step("en: hero title = \"Spring collection\"");
    session.set_current_language("es");
    session.update_block(&hero, BlockUpdate::new().with_field("title", "Colección de primavera"));
    step("es: hero title = \"Colección de primavera\"");
    show_document(&session.document());
    session.set_current_language("en");

    section("Phase 3: Rearrange");
    session.reorder_block(&features, 2);
    step("moved features to the end");
    let copy = session.duplicate_block(&hero);
    step("duplicated hero");
    if let Some(copy) = copy {
        session.set_selection(Some(copy));
    }
    show_document(&session.document());

    section("Phase 4: Autosave");
    step(&format!("phase: {:?}", session.autosave_phase()));
    tokio::time::sleep(Duration::from_millis(300)).await;
    let status = session.autosave_status();
    step(&format!(
        "writes: {}, last saved: {}",
        storage.write_count(),
        status
            .last_saved
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string())
    ));

    while let Ok(note) = notes.try_recv() {
        match note.level {
            NotificationLevel::Error => println!("  {} {}", "✗".bright_red(), note.message),
            _ => ok(&note.message),
        }
    }

    session.close();
    Ok(())
}

async fn run_undo_demo() -> pw_sdk::Result<()> {
    header("UNDO — Remove, undo, redo via keyboard");

    let session = EditorSession::open(MemoryStorage::new(), EditorConfig::default()).await?;
    let keymap = Keymap::default();

    section("Phase 1: [A, B, C] with B selected");
    session.add_block(BlockType::Hero, None);
    let b = session.add_block(BlockType::Pricing, None);
    session.add_block(BlockType::Team, None);
    session.set_selection(Some(b));
    show_document(&session.document());

    let chords = [
        ("Delete", KeyChord::new(Key::Delete)),
        ("Ctrl+Z", KeyChord::new(Key::Char('z')).ctrl()),
        ("Ctrl+Shift+Z", KeyChord::new(Key::Char('z')).ctrl().shift()),
        ("Ctrl+Shift+Z", KeyChord::new(Key::Char('z')).ctrl().shift()),
    ];
    for (name, chord) in chords {
        section(&format!("Press {}", name));
        let outcome = dispatch(&session, &keymap, chord).await;
        print_dispatch(&outcome);
        show_document(&session.document());
    }

    session.close();
    Ok(())
}

// ─── Persistent commands ──────────────────────────────────────────────────

async fn open_page(dir: PathBuf) -> Result<EditorSession<FileStorage>, String> {
    let storage = FileStorage::open(dir).await.map_err(|e| e.to_string())?;
    let config = EditorConfigBuilder::new()
        .autosave(AutosaveConfigBuilder::new().enabled(false).build())
        .build();
    EditorSession::open(storage, config)
        .await
        .map_err(|e| e.to_string())
}

fn block_at<S: StorageBackend>(session: &EditorSession<S>, index: usize) -> Result<BlockId, String> {
    session
        .block_ids()
        .get(index)
        .cloned()
        .ok_or_else(|| format!("no block at index {} (page has {})", index, session.len()))
}

async fn save_page<S: StorageBackend>(session: &EditorSession<S>) -> Result<(), String> {
    match session.save().await.map_err(|e| e.to_string())? {
        SaveOutcome::Saved(doc) => ok(&format!("Saved version {}", doc.version)),
        SaveOutcome::Unchanged | SaveOutcome::NothingToSave => {
            println!("  {} no changes", "–".bright_yellow())
        }
    }
    Ok(())
}

async fn run_command(dir: PathBuf, command: Commands) -> Result<(), String> {
    match command {
        Commands::Demo => run_demo().await.map_err(|e| e.to_string()),
        Commands::UndoDemo => run_undo_demo().await.map_err(|e| e.to_string()),

        Commands::Show { lang } => {
            let session = open_page(dir).await?;
            if let Some(lang) = lang {
                session.set_current_language(lang);
            }
            show_document(&session.document());
            Ok(())
        }

        Commands::Add { block_type, at } => {
            let session = open_page(dir).await?;
            session.add_block(block_type, at);
            show_document(&session.document());
            save_page(&session).await
        }

        Commands::Remove { index } => {
            let session = open_page(dir).await?;
            let id = block_at(&session, index)?;
            session.remove_block(&id);
            show_document(&session.document());
            save_page(&session).await
        }

        Commands::Duplicate { index } => {
            let session = open_page(dir).await?;
            let id = block_at(&session, index)?;
            session.duplicate_block(&id);
            show_document(&session.document());
            save_page(&session).await
        }

        Commands::Move { index, to } => {
            let session = open_page(dir).await?;
            let id = block_at(&session, index)?;
            if !session.reorder_block(&id, to) {
                println!("  {} already at position {}", "–".bright_yellow(), index);
            }
            show_document(&session.document());
            save_page(&session).await
        }

        Commands::Set {
            index,
            key,
            value,
            lang,
            setting,
        } => {
            let session = open_page(dir).await?;
            let id = block_at(&session, index)?;
            if let Some(lang) = lang {
                session.set_current_language(LanguageCode::new(lang));
            }
            let update = if setting {
                BlockUpdate::new().with_setting(key, parse_value(&value))
            } else {
                BlockUpdate::new().with_field(key, parse_value(&value))
            };
            if !session.update_block(&id, update) {
                println!("  {} value unchanged", "–".bright_yellow());
            }
            show_document(&session.document());
            save_page(&session).await
        }

        Commands::Backup { suffix } => {
            let session = open_page(dir).await?;
            let record = session
                .create_backup(suffix.as_deref())
                .await
                .map_err(|e| e.to_string())?;
            ok(&format!("Backup written to {}", record.key));
            Ok(())
        }

        Commands::Backups => {
            let session = open_page(dir).await?;
            let backups = session.backups().await.map_err(|e| e.to_string())?;
            if backups.is_empty() {
                step("no backups");
            }
            for backup in backups {
                step(&format!(
                    "{}  {}  ({} blocks)",
                    backup.backed_up_at.to_rfc3339().dimmed(),
                    backup.key,
                    backup.document.len()
                ));
            }
            Ok(())
        }

        Commands::Restore { key } => {
            let session = open_page(dir).await?;
            session
                .restore_backup(&key)
                .await
                .map_err(|e| e.to_string())?;
            show_document(&session.document());
            save_page(&session).await
        }

        Commands::Prune { keep } => {
            let session = open_page(dir).await?;
            let removed = session
                .prune_backups(keep)
                .await
                .map_err(|e| e.to_string())?;
            ok(&format!("Removed {} backup(s)", removed.len()));
            Ok(())
        }
    }
}

// ─── Entry point ───────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run_command(cli.dir, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".bright_red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
