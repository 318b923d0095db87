//! Vegetable name normalization
//!
//! Maps multilingual spellings and common misspellings onto one canonical English name.
//! Unknown names pass through (lowercased and trimmed) so new produce can be ingested
//! without a table update.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Synonym table: lowercase variant → canonical name
static SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("tomate", "tomato"),
        ("tomatoes", "tomato"),
        ("tomaot", "tomato"),
        ("tomatto", "tomato"),
        ("poire", "pear"),
        ("peer", "pear"),
        ("pera", "pear"),
        ("carotte", "carrot"),
        ("zanahoria", "carrot"),
        ("pomme de terre", "potato"),
        ("patata", "potato"),
        ("oignon", "onion"),
        ("cebolla", "onion"),
        ("poivron", "pepper"),
        ("pimiento", "pepper"),
        ("brusel sprout", "brussels sprout"),
        ("brussel sprout", "brussels sprout"),
        ("brussell sprout", "brussels sprout"),
        ("brusselsprout", "brussels sprout"),
    ])
});

/// Normalize a raw vegetable label to its canonical name
///
/// Total and idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let name = raw.trim().to_lowercase();
    match SYNONYMS.get(name.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => name,
    }
}
