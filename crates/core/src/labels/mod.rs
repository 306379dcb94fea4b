//! Label normalization for ground-truth and prediction datasets.
//!
//! Raw labels arrive as small integers, as curated free text ("Rust Bounds Check
//! Bypass Attack") or as loose descriptions. `normalize_attack_label` maps all
//! of them onto the canonical 0..=5 taxonomy. Anything that carries no known
//! attack keyword resolves to `0` (safe); only an empty label means "no label".
//!
//! Model-generated CSV rows go through a different, simpler heuristic in
//! `crate::response`; the two share no code.

pub mod dataset;

/// Exact phrases (after lower-casing and removing "attack") and their labels.
const KNOWN_PHRASES: &[(&str, u8)] = &[
    ("rust bounds check bypass", 1),
    ("bounds check bypass", 1),
    ("rust lifetime bypass", 2),
    ("lifetime bypass", 2),
    ("uaf", 2),
    ("use-after-free", 2),
    ("double-free", 2),
    ("hardening bypass via stack overflow", 3),
    ("hardening bypass", 3),
    ("c/c++ hardening bypass", 3),
    ("dynamic bounds corruption (vec metadata)", 4),
    ("dynamic bounds corruption", 4),
    ("vec metadata", 4),
    ("intended interaction corruption", 5),
    ("callback poisoning", 5),
];

/// Keyword groups, checked in order; the first group with a hit wins.
///
/// A description mentioning both "stack" and "callback" therefore maps to 3.
const KEYWORD_GROUPS: &[(&[&str], u8)] = &[
    (&["bounds"], 1),
    (&["lifetime", "uaf", "use-after", "double-free"], 2),
    (&["hardening", "shadow", "cfi", "stack"], 3),
    (&["dynamic", "vec", "metadata"], 4),
    (&["intended", "callback", "poison"], 5),
];

/// Parse a trimmed string as a label in `0..=5`.
pub fn parse_numeric_label(raw: &str) -> Option<u8> {
    raw.trim().parse::<i64>().ok().filter(|v| (0..=5).contains(v)).map(|v| v as u8)
}

/// Normalize a raw `attack_type` string to a canonical label.
///
/// Returns `None` only when the input is empty after trimming.
pub fn normalize_attack_label(raw: &str) -> Option<u8> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(label) = parse_numeric_label(raw) {
        return Some(label);
    }

    let key = raw.to_lowercase().replace("attack", "");
    let key = key.trim();

    if let Some((_, label)) = KNOWN_PHRASES.iter().find(|(phrase, _)| *phrase == key) {
        return Some(*label);
    }

    for (keywords, label) in KEYWORD_GROUPS {
        if keywords.iter().any(|kw| key.contains(kw)) {
            return Some(*label);
        }
    }

    Some(0)
}

/// Resolve a ground-truth row: a valid numeric `label` column wins, otherwise
/// `attack_type` is normalized.
pub fn ground_truth_label(label: Option<&str>, attack_type: Option<&str>) -> Option<u8> {
    label
        .and_then(parse_numeric_label)
        .or_else(|| normalize_attack_label(attack_type.unwrap_or("")))
}
