//! Default content and settings for each block type.
//!
//! New blocks start from these placeholders. The same placeholder object is
//! used for every language; translators overwrite it per language.

use crate::block::{BlockType, Settings};
use crate::content::ContentObject;
use serde_json::{json, Value};

fn object(value: Value) -> ContentObject {
    match value {
        Value::Object(map) => map,
        _ => ContentObject::new(),
    }
}

/// Placeholder content for a freshly inserted block.
pub fn default_content(block_type: BlockType) -> ContentObject {
    object(match block_type {
        BlockType::Hero => json!({
            "title": "Welcome to our site",
            "subtitle": "Tell visitors what you do in one sentence.",
            "ctaText": "Get started",
            "ctaLink": "#"
        }),
        BlockType::Features => json!({
            "title": "Features",
            "items": [
                {"title": "Fast", "description": "Pages load in the blink of an eye."},
                {"title": "Simple", "description": "No technical knowledge required."},
                {"title": "Flexible", "description": "Arrange blocks however you like."}
            ]
        }),
        BlockType::CallToAction => json!({
            "title": "Ready to begin?",
            "description": "Join today and see the difference.",
            "buttonText": "Sign up",
            "buttonLink": "#"
        }),
        BlockType::Testimonials => json!({
            "title": "What our customers say",
            "items": [
                {"quote": "Excellent service.", "author": "Jane Doe", "role": "Customer"}
            ]
        }),
        BlockType::ContactForm => json!({
            "title": "Contact us",
            "description": "We usually reply within one business day.",
            "submitText": "Send",
            "successMessage": "Thanks, we received your message."
        }),
        BlockType::ProductGrid => json!({
            "title": "Our products",
            "items": []
        }),
        BlockType::Pricing => json!({
            "title": "Pricing",
            "plans": [
                {"name": "Basic", "price": "9", "features": ["1 site"]},
                {"name": "Pro", "price": "29", "features": ["10 sites", "Priority support"]}
            ]
        }),
        BlockType::LogoCloud => json!({
            "title": "Trusted by",
            "logos": []
        }),
        BlockType::About => json!({
            "title": "About us",
            "body": "Tell your story here."
        }),
        BlockType::Gallery => json!({
            "title": "Gallery",
            "images": []
        }),
        BlockType::Team => json!({
            "title": "Meet the team",
            "members": []
        }),
    })
}

/// Default settings for a freshly inserted block.
pub fn default_settings(block_type: BlockType) -> Settings {
    let specific = match block_type {
        BlockType::Hero => json!({"alignment": "center", "fullHeight": false}),
        BlockType::Features => json!({"columns": 3}),
        BlockType::CallToAction => json!({"variant": "primary"}),
        BlockType::Testimonials => json!({"layout": "carousel"}),
        BlockType::ContactForm => json!({"fields": ["name", "email", "message"]}),
        BlockType::ProductGrid => json!({"columns": 3, "showPrices": true}),
        BlockType::Pricing => json!({"highlightPlan": 1}),
        BlockType::LogoCloud => json!({"grayscale": true}),
        BlockType::About => json!({"imagePosition": "right"}),
        BlockType::Gallery => json!({"columns": 4, "lightbox": true}),
        BlockType::Team => json!({"columns": 4}),
    };

    let mut settings = object(json!({
        "background": "default",
        "padding": "medium"
    }));
    settings.extend(object(specific));
    settings
}
