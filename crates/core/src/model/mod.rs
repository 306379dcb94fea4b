//! Core data model shared by extraction, slicing, labelling and evaluation.
//!
//! - `SourceLanguage`: the two languages on either side of the FFI boundary.
//! - `AttackClass`: the six-label cross-language attack taxonomy.
//! - `StructuralItem`: one syntactic unit found by the structural extractor.
//! - `FunctionSlice`: a heuristically bounded function body used for batching.
//! - `FunctionAnnotation`: one predicted label row parsed from a model response.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mapping of function name to canonical label (0..=5).
///
/// Ordered so that joins and reports are deterministic.
pub type LabelMap = BTreeMap<String, u8>;

/// Number of canonical labels, including the safe class.
pub const CLASS_COUNT: usize = 6;

/// Language on one side of the FFI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    Rust,
    C,
}

impl SourceLanguage {
    /// Map a file path to a language by extension (`.rs`, `.c`, `.h`).
    ///
    /// Matching is case-sensitive; anything else is not a source file we walk.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("rs") => Some(SourceLanguage::Rust),
            Some("c") | Some("h") => Some(SourceLanguage::C),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceLanguage::Rust => "rust",
            SourceLanguage::C => "c",
        }
    }

    /// Tree-sitter grammar for this language.
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            SourceLanguage::Rust => tree_sitter_rust::LANGUAGE.into(),
            SourceLanguage::C => tree_sitter_c::LANGUAGE.into(),
        }
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rust" | "rs" => Ok(SourceLanguage::Rust),
            "c" => Ok(SourceLanguage::C),
            other => Err(format!("Unsupported language '{other}' (expected 'c' or 'rust')")),
        }
    }
}

/// Cross-language attack taxonomy.
///
/// Label `0` is safe; `1..=5` are the attack patterns a function can take part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttackClass {
    Safe,
    /// C performs out-of-bounds writes into Rust-owned memory.
    BoundsCheckBypass,
    /// C frees or invalidates Rust-owned memory that Rust later uses.
    LifetimeBypass,
    /// C corrupts control-flow data that Rust later calls through.
    HardeningBypass,
    /// C rewrites Vec metadata (ptr, len, cap) behind Rust's back.
    DynamicBoundsCorruption,
    /// C hands Rust forged integers or pointers that are trusted as callbacks.
    IntendedInteractionCorruption,
}

impl AttackClass {
    pub const ALL: [AttackClass; CLASS_COUNT] = [
        AttackClass::Safe,
        AttackClass::BoundsCheckBypass,
        AttackClass::LifetimeBypass,
        AttackClass::HardeningBypass,
        AttackClass::DynamicBoundsCorruption,
        AttackClass::IntendedInteractionCorruption,
    ];

    pub fn from_label(label: u8) -> Option<Self> {
        Self::ALL.get(label as usize).copied()
    }

    pub fn label(self) -> u8 {
        match self {
            AttackClass::Safe => 0,
            AttackClass::BoundsCheckBypass => 1,
            AttackClass::LifetimeBypass => 2,
            AttackClass::HardeningBypass => 3,
            AttackClass::DynamicBoundsCorruption => 4,
            AttackClass::IntendedInteractionCorruption => 5,
        }
    }

    /// Human-readable title used in summaries.
    pub fn title(self) -> &'static str {
        match self {
            AttackClass::Safe => "Safe",
            AttackClass::BoundsCheckBypass => "Rust Bounds Check Bypass",
            AttackClass::LifetimeBypass => "Rust Lifetime Bypass",
            AttackClass::HardeningBypass => "C/C++ Hardening Bypass",
            AttackClass::DynamicBoundsCorruption => "Dynamic Bounds Corruption",
            AttackClass::IntendedInteractionCorruption => "Intended Interaction Corruption",
        }
    }
}

impl fmt::Display for AttackClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackClass::Safe => f.write_str("Safe (0)"),
            other => write!(f, "Attack {}", other.label()),
        }
    }
}

/// Kind of structural item emitted by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Function,
    ExternBlock,
    UnsafeBlock,
    FunctionDeclaration,
}

impl ItemKind {
    /// Whether items of this kind always carry a function name.
    pub fn is_named(self) -> bool {
        matches!(self, ItemKind::Function | ItemKind::FunctionDeclaration)
    }
}

/// One syntactic unit of interest within a source file.
///
/// Serialized as the persisted intermediate record consumed by the annotator:
/// `{ "file", "type", "function_name"?, "start_line", "end_line" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralItem {
    pub file: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    /// 1-indexed, inclusive.
    pub start_line: usize,
    /// 1-indexed, inclusive.
    pub end_line: usize,
}

/// Sort items by (file, start_line); stable, so traversal order breaks ties.
pub fn sort_items(items: &mut [StructuralItem]) {
    items.sort_by(|a, b| a.file.cmp(&b.file).then(a.start_line.cmp(&b.start_line)));
}

/// Textual extraction of one function, bounded by the slicer's brace heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSlice {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub body_text: String,
}

/// A single `function_name,attack_type` prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionAnnotation {
    pub function_name: String,
    pub attack_type: u8,
}

impl FunctionAnnotation {
    pub fn new(function_name: impl Into<String>, attack_type: u8) -> Self {
        Self { function_name: function_name.into(), attack_type }
    }

    pub fn class(&self) -> Option<AttackClass> {
        AttackClass::from_label(self.attack_type)
    }
}
