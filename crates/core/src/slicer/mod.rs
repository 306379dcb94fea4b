//! Line-oriented function slicing used to build classification batches.
//!
//! This is a heuristic, not a parse: a function starts on a line matching a
//! language-specific signature pattern and ends on the first line where naive
//! brace counting returns to zero after an opening brace was seen. Braces inside
//! string literals, character literals or comments are counted like any other.
//!
//! The slicer is independent from `extract`; the two never share results.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{FunctionSlice, SourceLanguage};

/// Default number of functions sent in one classification request.
pub const DEFAULT_MAX_FUNCS_PER_BATCH: usize = 20;

static C_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(void|int64_t|int|static\s+void|static\s+int64_t|static\s+int)\s+(\w+)\s*\(",
    )
    .expect("valid c signature regex")
});

static RUST_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(pub\s+)?(extern\s+"C"\s+)?fn\s+(\w+)"#).expect("valid rust signature regex")
});

/// Name captured from a signature line, if the (trimmed) line starts a function.
fn signature_name(line: &str, language: SourceLanguage) -> Option<&str> {
    let (re, group) = match language {
        SourceLanguage::C => (&*C_SIGNATURE, 2),
        SourceLanguage::Rust => (&*RUST_SIGNATURE, 3),
    };
    re.captures(line).and_then(|caps| caps.get(group)).map(|m| m.as_str())
}

/// Slice every detected function out of `source`, in source order.
pub fn slice_functions(source: &str, language: SourceLanguage) -> Vec<FunctionSlice> {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut slices = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let Some(name) = signature_name(line.trim(), language) else {
            continue;
        };
        let start_line = idx + 1;
        let end_line = find_end_line(&lines, idx).unwrap_or(start_line);
        slices.push(FunctionSlice {
            name: name.to_string(),
            start_line,
            end_line,
            body_text: lines[idx..end_line].join("\n"),
        });
    }

    slices
}

/// 1-indexed line where brace depth first returns to zero after a `{`.
///
/// `None` when the braces never balance (or no `{` is ever seen).
fn find_end_line(lines: &[&str], start_idx: usize) -> Option<usize> {
    let mut depth: i64 = 0;
    let mut found_start = false;

    for (j, line) in lines.iter().enumerate().skip(start_idx) {
        let opens = line.matches('{').count() as i64;
        let closes = line.matches('}').count() as i64;
        if opens > 0 {
            found_start = true;
            depth += opens;
        }
        depth -= closes;
        if found_start && depth == 0 {
            return Some(j + 1);
        }
    }
    None
}

/// First `max(1, max_funcs)` slices; the remainder is not sent in this batch.
pub fn select_batch(slices: &[FunctionSlice], max_funcs: usize) -> &[FunctionSlice] {
    let n = max_funcs.max(1).min(slices.len());
    &slices[..n]
}
