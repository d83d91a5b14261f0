//! The page document.

use crate::block::{Block, BlockId};
use crate::content::ContentObject;
use crate::language::LanguageCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A page: an ordered sequence of blocks plus editing view state.
///
/// `current_language` and `selected_block_id` are view state; `version` and
/// `last_modified` are stamped by the persistence layer on every save.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredDocument")]
pub struct Document {
    /// Blocks in display order.
    pub blocks: Vec<Block>,
    /// Languages every new block is given content for.
    pub languages: Vec<LanguageCode>,
    /// Fallback language for missing translations.
    pub default_language: LanguageCode,
    /// Language currently being edited or previewed.
    pub current_language: LanguageCode,
    /// The selected block, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_block_id: Option<BlockId>,
    /// Number of durable saves so far.
    #[serde(default)]
    pub version: u64,
    /// Time of the last durable save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Persisted form of [`Document`]. Block content does not carry its
/// fallback language, so it is filled in from `defaultLanguage`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocument {
    blocks: Vec<Block>,
    languages: Vec<LanguageCode>,
    default_language: LanguageCode,
    current_language: LanguageCode,
    #[serde(default)]
    selected_block_id: Option<BlockId>,
    #[serde(default)]
    version: u64,
    #[serde(default)]
    last_modified: Option<DateTime<Utc>>,
}

impl From<StoredDocument> for Document {
    fn from(stored: StoredDocument) -> Self {
        let mut blocks = stored.blocks;
        for block in &mut blocks {
            block.content.set_default_language(stored.default_language.clone());
        }
        Self {
            blocks,
            languages: stored.languages,
            default_language: stored.default_language,
            current_language: stored.current_language,
            selected_block_id: stored.selected_block_id,
            version: stored.version,
            last_modified: stored.last_modified,
        }
    }
}

/// The part of a document that counts as content when comparing documents.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalView<'a> {
    blocks: &'a [Block],
    languages: &'a [LanguageCode],
    default_language: &'a LanguageCode,
}

impl Document {
    /// Create an empty document.
    ///
    /// The default language is added to `languages` if it is missing.
    pub fn new(languages: Vec<LanguageCode>, default_language: impl Into<LanguageCode>) -> Self {
        let default_language = default_language.into();
        let mut languages = languages;
        if !languages.contains(&default_language) {
            languages.insert(0, default_language.clone());
        }

        Self {
            blocks: Vec::new(),
            languages,
            current_language: default_language.clone(),
            default_language,
            selected_block_id: None,
            version: 0,
            last_modified: None,
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Position of a block in the sequence.
    pub fn index_of(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id() == id)
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    pub fn block_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id() == id)
    }

    /// The currently selected block.
    pub fn selected_block(&self) -> Option<&Block> {
        self.selected_block_id
            .as_ref()
            .and_then(|id| self.block(id))
    }

    /// Content of a block in the current language, with default-language fallback.
    pub fn resolved_content(&self, id: &BlockId) -> Option<&ContentObject> {
        self.block(id)
            .and_then(|b| b.content.get(&self.current_language))
    }

    /// Canonical serialization used for change detection.
    ///
    /// Covers blocks and the language setup; view state and save stamps are
    /// left out, so two documents differing only in those compare equal.
    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&CanonicalView {
            blocks: &self.blocks,
            languages: &self.languages,
            default_language: &self.default_language,
        })
    }

    /// Structural equality through the canonical serialization.
    pub fn same_content(&self, other: &Document) -> bool {
        match (self.canonical_json(), other.canonical_json()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(vec![LanguageCode::default()], LanguageCode::default())
    }
}
