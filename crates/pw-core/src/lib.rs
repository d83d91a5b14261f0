//! # pw-core
//!
//! Core data model for Pagewright, a block-based page editor.
//!
//! This crate provides:
//! - `Block`: a single content unit of a fixed type with per-language content
//! - `LocalizedContent`: language-keyed content with a default-language fallback
//! - `Document`: the ordered block sequence plus view state and save stamps
//! - A catalog of default content and settings for every block type
//!
//! The crate is pure data. Mutation, history and persistence live in
//! `pw-db` and `pw-storage`.
//!
//! ## Example
//!
//! ```rust
//! use pw_core::{Block, BlockType, Document, LanguageCode};
//!
//! let mut doc = Document::new(vec![LanguageCode::new("en"), LanguageCode::new("es")], "en");
//! let hero = Block::new(BlockType::Hero, &doc.languages, &doc.default_language);
//! let id = hero.id().clone();
//! doc.blocks.push(hero);
//!
//! // Spanish content exists from the start, English is the fallback.
//! assert!(doc.block(&id).unwrap().content.get_exact(&LanguageCode::new("es")).is_some());
//! ```

pub mod block;
pub mod catalog;
pub mod content;
pub mod document;
pub mod language;

pub use block::{Block, BlockId, BlockType, Settings, UnknownBlockType};
pub use content::{ContentObject, LocalizedContent};
pub use document::Document;
pub use language::LanguageCode;
