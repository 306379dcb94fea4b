//! Shallow function-name patterns applied to a node's own text.
//!
//! Not grammar-aware: a signature the pattern cannot match (e.g. a generic
//! Rust fn) yields `None` and the item is dropped.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::SourceLanguage;

static RUST_FN_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:pub\s+)?(?:unsafe\s+)?(?:extern\s+"C"\s+)?fn\s+(\w+)\s*\("#)
        .expect("valid rust fn-name regex")
});

static C_FN_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:static\s+)?(?:inline\s+)?(?:\w+\s+)*(\w+)\s*\(")
        .expect("valid c fn-name regex")
});

/// Extract a function name from a node's text, or `None` if the pattern misses.
pub fn function_name(code: &str, language: SourceLanguage) -> Option<String> {
    let re = match language {
        SourceLanguage::Rust => &*RUST_FN_NAME,
        SourceLanguage::C => &*C_FN_NAME,
    };
    re.captures(code).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
}
