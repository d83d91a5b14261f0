//! Property tests for the block model.
//!
//! - Language fallback never returns nothing while the default variant exists
//! - Merging never drops keys
//! - Canonical serialization ignores view state

use proptest::prelude::*;
use pw_core::{Block, BlockType, ContentObject, Document, LanguageCode, LocalizedContent};
use serde_json::Value;

fn language_strategy() -> impl Strategy<Value = LanguageCode> {
    "[a-z]{2}".prop_map(LanguageCode::new)
}

fn object_strategy() -> impl Strategy<Value = ContentObject> {
    prop::collection::btree_map("[a-z]{1,6}", "[a-zA-Z ]{0,12}", 0..6).prop_map(|fields| {
        fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect()
    })
}

fn block_type_strategy() -> impl Strategy<Value = BlockType> {
    (0..BlockType::ALL.len()).prop_map(|i| BlockType::ALL[i])
}

proptest! {
    #[test]
    fn fallback_always_resolves(
        default in language_strategy(),
        requested in language_strategy(),
        fields in object_strategy(),
    ) {
        let content = LocalizedContent::new(default.clone()).with_variant(default, fields.clone());
        prop_assert_eq!(content.get(&requested), Some(&fields));
    }

    #[test]
    fn merge_keeps_existing_keys(
        base in object_strategy(),
        partial in object_strategy(),
    ) {
        let en = LanguageCode::new("en");
        let mut content = LocalizedContent::new(en.clone()).with_variant(en.clone(), base.clone());
        content.merge(&en, &partial);

        let merged = content.get_exact(&en).unwrap();
        for key in base.keys() {
            prop_assert!(merged.contains_key(key));
        }
        for (key, value) in &partial {
            prop_assert_eq!(merged.get(key), Some(value));
        }
    }

    #[test]
    fn canonical_json_ignores_view_state(
        types in prop::collection::vec(block_type_strategy(), 0..8),
        language in language_strategy(),
        version in 0u64..1000,
    ) {
        let mut doc = Document::default();
        for t in types {
            let block = Block::new(t, &doc.languages, &doc.default_language);
            doc.blocks.push(block);
        }

        let mut viewed = doc.clone();
        viewed.current_language = language;
        viewed.version = version;
        viewed.selected_block_id = doc.blocks.first().map(|b| b.id().clone());

        prop_assert_eq!(doc.canonical_json().unwrap(), viewed.canonical_json().unwrap());
    }
}
