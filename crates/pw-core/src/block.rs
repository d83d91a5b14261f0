//! Blocks - the content units a page is assembled from.

use crate::catalog;
use crate::content::LocalizedContent;
use crate::language::LanguageCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

/// Language-independent configuration of a block.
pub type Settings = serde_json::Map<String, serde_json::Value>;

/// Unique identifier for a block.
///
/// Identifiers are ULIDs, so an id is never handed out twice, even after the
/// block it named has been deleted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed catalog of block variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    Hero,
    Features,
    CallToAction,
    Testimonials,
    ContactForm,
    ProductGrid,
    Pricing,
    LogoCloud,
    About,
    Gallery,
    Team,
}

impl BlockType {
    /// Every block type, in catalog order.
    pub const ALL: [BlockType; 11] = [
        BlockType::Hero,
        BlockType::Features,
        BlockType::CallToAction,
        BlockType::Testimonials,
        BlockType::ContactForm,
        BlockType::ProductGrid,
        BlockType::Pricing,
        BlockType::LogoCloud,
        BlockType::About,
        BlockType::Gallery,
        BlockType::Team,
    ];

    /// The kebab-case tag used in persisted documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Hero => "hero",
            BlockType::Features => "features",
            BlockType::CallToAction => "call-to-action",
            BlockType::Testimonials => "testimonials",
            BlockType::ContactForm => "contact-form",
            BlockType::ProductGrid => "product-grid",
            BlockType::Pricing => "pricing",
            BlockType::LogoCloud => "logo-cloud",
            BlockType::About => "about",
            BlockType::Gallery => "gallery",
            BlockType::Team => "team",
        }
    }

    /// Human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            BlockType::Hero => "Hero",
            BlockType::Features => "Features",
            BlockType::CallToAction => "Call to action",
            BlockType::Testimonials => "Testimonials",
            BlockType::ContactForm => "Contact form",
            BlockType::ProductGrid => "Product grid",
            BlockType::Pricing => "Pricing",
            BlockType::LogoCloud => "Logo cloud",
            BlockType::About => "About",
            BlockType::Gallery => "Gallery",
            BlockType::Team => "Team",
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when parsing a tag outside the block catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown block type: {0}")]
pub struct UnknownBlockType(pub String);

impl std::str::FromStr for BlockType {
    type Err = UnknownBlockType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownBlockType(s.to_string()))
    }
}

/// A single content unit on the page.
///
/// A block's position is its index in the owning document, it is not stored
/// on the block itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    id: BlockId,
    /// The block variant.
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Per-language content.
    pub content: LocalizedContent,
    /// Language-independent settings.
    #[serde(default)]
    pub settings: Settings,
}

impl Block {
    /// Create a block with catalog defaults for every language in `languages`.
    pub fn new(
        block_type: BlockType,
        languages: &[LanguageCode],
        default_language: &LanguageCode,
    ) -> Self {
        let mut content = LocalizedContent::new(default_language.clone());
        let defaults = catalog::default_content(block_type);
        for language in languages {
            content.set(language.clone(), defaults.clone());
        }
        if content.get_exact(default_language).is_none() {
            content.set(default_language.clone(), defaults);
        }

        Self {
            id: BlockId::new(),
            block_type,
            content,
            settings: catalog::default_settings(block_type),
        }
    }

    /// Assemble a block from parts (used when restoring persisted data).
    pub fn from_parts(
        id: BlockId,
        block_type: BlockType,
        content: LocalizedContent,
        settings: Settings,
    ) -> Self {
        Self {
            id,
            block_type,
            content,
            settings,
        }
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    /// Deep copy of this block under a fresh id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: BlockId::new(),
            block_type: self.block_type,
            content: self.content.clone(),
            settings: self.settings.clone(),
        }
    }
}
