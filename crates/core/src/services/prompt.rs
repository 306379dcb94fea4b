use std::collections::BTreeSet;
use std::fmt::Write;

use crate::config::AnnotatorConfig;
use crate::model::{ItemKind, SourceLanguage, StructuralItem};
use crate::response::{ANNOTATED_MARKER, CSV_HEADER, CSV_MARKER};

/// Caps on how much input goes into one prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptLimits {
    pub max_items: usize,
    pub max_source_chars: usize,
}

impl From<&AnnotatorConfig> for PromptLimits {
    fn from(config: &AnnotatorConfig) -> Self {
        Self { max_items: config.max_parser_items, max_source_chars: config.max_source_chars }
    }
}

const TAXONOMY: &str = "\
ATTACK DEFINITIONS
These are cross-language attacks. They only apply when a function takes part in a
concrete Rust/C interaction path (FFI functions, extern declarations, callbacks).
A function local to one language with no such exchange is 0 (Safe).

Attack 1 - Rust Bounds Check Bypass
  C performs out-of-bounds writes into memory owned or later read by Rust through
  FFI-exposed pointers, slices or buffers.

Attack 2 - Rust Lifetime Bypass (Use-After-Free / Double-Free)
  Rust hands C a pointer or handle, C frees or invalidates it, Rust later uses it.

Attack 3 - C/C++ Hardening Bypass (CFI / Shadow-Stack Bypass)
  C corrupts its own control-flow data (stack frame, function pointers, vtables)
  and Rust later performs an indirect call with the corrupted data.

Attack 4 - Dynamic Bounds Corruption (Vec Metadata Attack)
  C receives a pointer to a Rust Vec and overwrites its ptr/len/cap, so later Rust
  indexing looks checked but is out of bounds.

Attack 5 - Intended Interaction Corruption (Callback Poisoning)
  One side returns forged integers or pointers that the other blindly treats as
  function callbacks.
";

const ANNOTATION_RULES: &str = "\
ANNOTATION RULES
Before each function insert a comment block:

/* ================================================
   Function: <function_name>
   Attack Classification: <Attack N or \"0 - Safe\">
   Reason: <1-3 lines based on the code and parsed items>
   Risk Level: <Low|Medium|High>
   ================================================ */

then the original function code, unchanged. Only add comments. Inline
`// SECURITY WARNING: <short explanation>` comments are allowed.
";

/// Build the user prompt for one classification request.
pub fn build_analysis_prompt(
    items: &[StructuralItem],
    source: &str,
    language: SourceLanguage,
    limits: PromptLimits,
) -> String {
    let items = &items[..items.len().min(limits.max_items)];
    let lang_upper = language.as_str().to_uppercase();
    let lang = language.as_str();
    let items_json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "Analyse the {lang_upper} source below for Rust-C FFI security issues.");
    let _ = writeln!(
        out,
        "You receive the raw source and its parsed structural items (tree-sitter)."
    );
    let _ = writeln!(
        out,
        "Produce annotated code and a CSV table giving each function an attack type"
    );
    let _ = writeln!(out, "in {{1,2,3,4,5}}, or 0 when no attack applies.");
    let _ = writeln!(out);
    let _ = writeln!(out, "{TAXONOMY}");
    let _ = writeln!(out, "{ANNOTATION_RULES}");
    let _ = writeln!(out, "OUTPUT FORMAT (MANDATORY)");
    let _ = writeln!(out, "Output exactly these two sections, in this order:");
    let _ = writeln!(out);
    let _ = writeln!(out, "{ANNOTATED_MARKER}");
    let _ = writeln!(out, "<annotated code>");
    let _ = writeln!(out);
    let _ = writeln!(out, "{CSV_MARKER}");
    let _ = writeln!(out, "{CSV_HEADER}");
    let _ = writeln!(out, "user_set_array,3");
    let _ = writeln!(out, "safe_function,0");
    let _ = writeln!(out);
    let _ = writeln!(out, "No explanations outside code comments. No code fences around the CSV.");
    let _ = writeln!(out);
    let _ = writeln!(out, "FFI context summary:");
    let _ = writeln!(out, "{}", ffi_summary(items));
    let _ = writeln!(out);
    let _ = writeln!(out, "Raw {lang_upper} source:");
    let _ = writeln!(out, "```{lang}");
    let _ = writeln!(out, "{}", truncate_chars(source, limits.max_source_chars));
    let _ = writeln!(out, "```");
    let _ = writeln!(out);
    let _ = writeln!(out, "Parsed items:");
    let _ = writeln!(out, "```json");
    let _ = writeln!(out, "{items_json}");
    let _ = writeln!(out, "```");
    out
}

/// Short FFI-oriented digest of the structural items.
pub fn ffi_summary(items: &[StructuralItem]) -> String {
    let mut names = BTreeSet::new();
    let mut extern_blocks = 0;
    let mut unsafe_blocks = 0;
    for item in items {
        if matches!(item.kind, ItemKind::FunctionDeclaration | ItemKind::ExternBlock) {
            if let Some(name) = &item.function_name {
                names.insert(name.as_str());
            }
        }
        match item.kind {
            ItemKind::ExternBlock => extern_blocks += 1,
            ItemKind::UnsafeBlock => unsafe_blocks += 1,
            _ => {}
        }
    }

    let mut lines = Vec::new();
    if !names.is_empty() {
        let joined: Vec<&str> = names.into_iter().collect();
        lines.push(format!("- FFI-relevant functions: {}", joined.join(", ")));
    }
    if extern_blocks > 0 {
        lines.push(format!("- Extern/FFI blocks: {extern_blocks}"));
    }
    if unsafe_blocks > 0 {
        lines.push(format!("- Unsafe blocks: {unsafe_blocks}"));
    }
    if lines.is_empty() {
        "None explicitly detected.".to_string()
    } else {
        lines.join("\n")
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
