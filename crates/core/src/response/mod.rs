//! Parsing of free-text classification responses.
//!
//! A response is expected to carry two sections introduced by
//! `===== BEGIN ANNOTATED CODE =====` and `===== BEGIN CSV =====`. Models do not
//! always comply, so splitting is best-effort and never fails:
//!
//! 1. decorated markers, then bare `BEGIN ANNOTATED CODE` / `BEGIN CSV`;
//! 2. a bare `function_name,attack_type` table running to the next blank line;
//! 3. the whole response as annotated text and a header-only table.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::FunctionAnnotation;

pub const ANNOTATED_MARKER: &str = "===== BEGIN ANNOTATED CODE =====";
pub const CSV_MARKER: &str = "===== BEGIN CSV =====";
const ANNOTATED_MARKER_BARE: &str = "BEGIN ANNOTATED CODE";
const CSV_MARKER_BARE: &str = "BEGIN CSV";

/// Header row of the prediction table.
pub const CSV_HEADER: &str = "function_name,attack_type";

static FALLBACK_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)function_name,attack_type\s*\n(.*?)(?:\n\n|\z)")
        .expect("valid fallback table regex")
});

/// The two payloads carried by one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub annotated: String,
    pub table: String,
}

/// Split a response into annotated text and CSV text.
pub fn split_response(text: &str) -> ParsedResponse {
    if let Some(markers) = locate_markers(text) {
        let annotated = if markers.csv_start >= markers.annotated_end {
            clean_segment(&text[markers.annotated_end..markers.csv_start], true)
        } else {
            String::new()
        };
        let table = clean_segment(&text[markers.csv_end..], false);
        return ParsedResponse { annotated, table };
    }

    if let Some(caps) = FALLBACK_TABLE.captures(text) {
        let header_start = caps.get(0).map_or(0, |m| m.start());
        let rows = caps.get(1).map_or("", |m| m.as_str()).trim();
        return ParsedResponse {
            annotated: text[..header_start].trim().to_string(),
            table: format!("{CSV_HEADER}\n{rows}"),
        };
    }

    log::warn!("Could not parse response format; keeping the full response as annotated text");
    ParsedResponse { annotated: text.to_string(), table: format!("{CSV_HEADER}\n") }
}

struct MarkerPositions {
    annotated_end: usize,
    csv_start: usize,
    csv_end: usize,
}

fn locate_markers(text: &str) -> Option<MarkerPositions> {
    let (annotated, csv) = match (text.find(ANNOTATED_MARKER), text.find(CSV_MARKER)) {
        (Some(a), Some(c)) => ((a, ANNOTATED_MARKER.len()), (c, CSV_MARKER.len())),
        _ => (
            (text.find(ANNOTATED_MARKER_BARE)?, ANNOTATED_MARKER_BARE.len()),
            (text.find(CSV_MARKER_BARE)?, CSV_MARKER_BARE.len()),
        ),
    };
    Some(MarkerPositions {
        annotated_end: annotated.0 + annotated.1,
        csv_start: csv.0,
        csv_end: csv.0 + csv.1,
    })
}

fn is_fence(line: &str) -> bool {
    let t = line.trim();
    t.strip_prefix("```")
        .map_or(false, |rest| rest.chars().all(|c| c.is_alphanumeric() || c == '_'))
}

/// Blank lines and leftovers of marker lines such as `=====` or `2.`.
fn is_decoration(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| matches!(c, '=' | '*' | '#' | '-' | '.' | ' ') || c.is_ascii_digit())
}

/// Drop marker-line leftovers and code fences from one segment.
///
/// Only the partial line after the opening marker and, when `ends_at_marker`,
/// the partial line before the closing marker are checked for decoration.
fn clean_segment(segment: &str, ends_at_marker: bool) -> String {
    let mut lines: Vec<&str> =
        segment.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();
    if lines.first().is_some_and(|l| is_decoration(l)) {
        lines.remove(0);
    }
    if ends_at_marker && lines.last().is_some_and(|l| is_decoration(l)) {
        lines.pop();
    }
    let kept: Vec<&str> = lines.into_iter().filter(|l| !is_fence(l)).collect();
    kept.join("\n").trim().to_string()
}

fn is_integer_text(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Parse the rows of a prediction table (header skipped).
///
/// Integers in `0..=5` are taken as-is; integers outside that range, including
/// ones too large for `i64`, drop the row; anything else goes through
/// `row_attack_label`.
pub fn parse_annotation_rows(table: &str) -> Vec<FunctionAnnotation> {
    let lines: Vec<&str> = table.trim().split('\n').collect();
    if lines.len() < 2 {
        return Vec::new();
    }

    let mut annotations = Vec::new();
    for line in &lines[1..] {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((name, attack)) = line.split_once(',') else {
            continue;
        };
        let (name, attack) = (name.trim(), attack.trim());
        match attack.parse::<i64>() {
            Ok(v) if (0..=5).contains(&v) => {
                annotations.push(FunctionAnnotation::new(name, v as u8));
            }
            Ok(v) => log::debug!("Dropping row for {name}: label {v} out of range"),
            Err(_) if is_integer_text(attack) => {
                log::debug!("Dropping row for {name}: label {attack} out of range")
            }
            Err(_) => annotations.push(FunctionAnnotation::new(name, row_attack_label(attack))),
        }
    }
    annotations
}

/// Label heuristic for non-numeric model rows.
///
/// Digit and keyword checks alternate by class, first hit wins, default `0`.
/// Narrower than `labels::normalize_attack_label`; the two must not be merged.
pub fn row_attack_label(text: &str) -> u8 {
    let t = text.to_lowercase();
    if t.contains('1') || t.contains("bounds") {
        1
    } else if t.contains('2') || t.contains("lifetime") || t.contains("uaf") {
        2
    } else if t.contains('3') || t.contains("hardening") {
        3
    } else if t.contains('4') || t.contains("dynamic") || t.contains("vec") {
        4
    } else if t.contains('5') || t.contains("intended") || t.contains("callback") {
        5
    } else {
        0
    }
}
