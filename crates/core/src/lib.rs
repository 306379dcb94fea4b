//! ffi-lens-core
//!
//! Core library for analysing Rust/C code that talks across a foreign-function
//! interface and for scoring per-function attack classifications.
//!
//! This crate defines the shared model, the tree-sitter structural extractor,
//! the heuristic function slicer, label normalization, model-response parsing,
//! evaluation statistics, and the classification service that talks to an
//! external language model.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends; the CLI is a thin wrapper.

pub mod model;
pub mod extract;
pub mod slicer;
pub mod labels;
pub mod response;
pub mod evaluation;
pub mod services;
pub mod config;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
