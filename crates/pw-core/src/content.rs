//! Language-keyed block content.
//!
//! Every block stores one content object per language. Exactly one language
//! is the fallback: reading a language that has no variant yields the
//! fallback variant instead.

use crate::language::LanguageCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A JSON object holding the fields of one language variant.
///
/// Keys are kept sorted, which keeps serialized documents canonical.
pub type ContentObject = serde_json::Map<String, serde_json::Value>;

/// Content of a block in every language it has been written in.
///
/// Serialized as a plain `{language: object}` map. The fallback language
/// belongs to the owning document, which sets it again after loading.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalizedContent {
    /// The fallback language.
    default_language: LanguageCode,
    /// One content object per language.
    variants: BTreeMap<LanguageCode, ContentObject>,
}

impl LocalizedContent {
    /// Create empty content with the given fallback language.
    pub fn new(default_language: LanguageCode) -> Self {
        Self {
            default_language,
            variants: BTreeMap::new(),
        }
    }

    /// Builder-style variant insertion.
    pub fn with_variant(mut self, language: LanguageCode, content: ContentObject) -> Self {
        self.variants.insert(language, content);
        self
    }

    pub fn default_language(&self) -> &LanguageCode {
        &self.default_language
    }

    pub fn set_default_language(&mut self, language: LanguageCode) {
        self.default_language = language;
    }

    /// Content for `language`, falling back to the default language.
    pub fn get(&self, language: &LanguageCode) -> Option<&ContentObject> {
        self.variants
            .get(language)
            .or_else(|| self.variants.get(&self.default_language))
    }

    /// Content for exactly `language`, without fallback.
    pub fn get_exact(&self, language: &LanguageCode) -> Option<&ContentObject> {
        self.variants.get(language)
    }

    /// Replace the variant for `language`.
    pub fn set(&mut self, language: LanguageCode, content: ContentObject) {
        self.variants.insert(language, content);
    }

    /// Shallow-merge `partial` into the variant for `language`.
    ///
    /// A language without its own variant is first seeded with a copy of the
    /// fallback, so untouched fields keep rendering the fallback text.
    pub fn merge(&mut self, language: &LanguageCode, partial: &ContentObject) {
        if !self.variants.contains_key(language) {
            let seed = self
                .variants
                .get(&self.default_language)
                .cloned()
                .unwrap_or_default();
            self.variants.insert(language.clone(), seed);
        }

        if let Some(variant) = self.variants.get_mut(language) {
            for (key, value) in partial {
                variant.insert(key.clone(), value.clone());
            }
        }
    }

    /// Languages that have their own variant.
    pub fn languages(&self) -> impl Iterator<Item = &LanguageCode> {
        self.variants.keys()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

impl Serialize for LocalizedContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.variants.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LocalizedContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let variants = BTreeMap::deserialize(deserializer)?;
        Ok(Self {
            default_language: LanguageCode::default(),
            variants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: serde_json::Value) -> ContentObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_missing_language_falls_back_to_default() {
        let content = LocalizedContent::new(LanguageCode::new("en"))
            .with_variant(LanguageCode::new("en"), object(json!({"title": "Hello"})));

        let fr = content.get(&LanguageCode::new("fr")).unwrap();
        assert_eq!(fr["title"], json!("Hello"));
        assert!(content.get_exact(&LanguageCode::new("fr")).is_none());
    }

    #[test]
    fn test_merge_preserves_unspecified_keys() {
        let en = LanguageCode::new("en");
        let mut content = LocalizedContent::new(en.clone())
            .with_variant(en.clone(), object(json!({"title": "Hello", "subtitle": "World"})));

        content.merge(&en, &object(json!({"title": "Hi"})));

        let variant = content.get_exact(&en).unwrap();
        assert_eq!(variant["title"], json!("Hi"));
        assert_eq!(variant["subtitle"], json!("World"));
    }

    #[test]
    fn test_merge_into_new_language_seeds_from_fallback() {
        let en = LanguageCode::new("en");
        let de = LanguageCode::new("de");
        let mut content = LocalizedContent::new(en.clone())
            .with_variant(en.clone(), object(json!({"title": "Hello", "cta": "Go"})));

        content.merge(&de, &object(json!({"title": "Hallo"})));

        let variant = content.get_exact(&de).unwrap();
        assert_eq!(variant["title"], json!("Hallo"));
        assert_eq!(variant["cta"], json!("Go"));
        // fallback untouched
        assert_eq!(content.get_exact(&en).unwrap()["title"], json!("Hello"));
    }

    #[test]
    fn test_serializes_as_language_map() {
        let content = LocalizedContent::new(LanguageCode::new("en"))
            .with_variant(LanguageCode::new("en"), object(json!({"title": "Hello"})))
            .with_variant(LanguageCode::new("fr"), object(json!({"title": "Bonjour"})));

        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(
            value,
            json!({"en": {"title": "Hello"}, "fr": {"title": "Bonjour"}})
        );

        let back: LocalizedContent = serde_json::from_value(value).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.get_exact(&LanguageCode::new("fr")).unwrap()["title"], json!("Bonjour"));
    }
}
