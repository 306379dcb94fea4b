//! Structural extraction over tree-sitter syntax trees.
//!
//! The extractor walks every node of a parsed Rust or C file and emits a flat
//! list of `StructuralItem`s: function definitions, `extern` blocks, `unsafe`
//! blocks, and (for C) function declarations. Names come from a shallow pattern
//! over each node's text (see `names`); nodes whose name cannot be matched are
//! dropped rather than emitted unnamed.
//!
//! Directory extraction isolates failures per file: a file that cannot be read
//! or parsed is logged and recorded, and the walk continues.

pub mod names;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};
use walkdir::WalkDir;

use crate::model::{sort_items, ItemKind, SourceLanguage, StructuralItem};

pub use names::function_name;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to parse {path}: syntax tree could not be built")]
    ParseFailure { path: String },
    #[error("Unsupported source file: {0}")]
    UnsupportedLanguage(PathBuf),
    #[error("Failed to load {language} grammar: {message}")]
    Grammar { language: SourceLanguage, message: String },
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file skipped during a directory walk, with the reason.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: ExtractError,
}

/// Result of walking a source directory.
#[derive(Debug, Default)]
pub struct DirectoryExtraction {
    /// Items from `.rs` files, sorted by (file, start_line).
    pub rust: Vec<StructuralItem>,
    /// Items from `.c` / `.h` files, sorted by (file, start_line).
    pub c: Vec<StructuralItem>,
    pub files_processed: usize,
    pub failures: Vec<FileFailure>,
}

impl DirectoryExtraction {
    pub fn items(&self, language: SourceLanguage) -> &[StructuralItem] {
        match language {
            SourceLanguage::Rust => &self.rust,
            SourceLanguage::C => &self.c,
        }
    }
}

/// Count of `Function` items in a slice of structural items.
pub fn function_count(items: &[StructuralItem]) -> usize {
    items.iter().filter(|i| i.kind == ItemKind::Function).count()
}

/// Holds one tree-sitter parser per supported language.
pub struct StructuralExtractor {
    rust: Parser,
    c: Parser,
}

impl StructuralExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            rust: parser_for(SourceLanguage::Rust)?,
            c: parser_for(SourceLanguage::C)?,
        })
    }

    /// Parse `source` and return its structural items, sorted by start line.
    ///
    /// `file` is the path identifier recorded on every item.
    pub fn extract_source(
        &mut self,
        file: &str,
        source: &[u8],
        language: SourceLanguage,
    ) -> Result<Vec<StructuralItem>, ExtractError> {
        let tree = self.parse(source, language).ok_or_else(|| ExtractError::ParseFailure {
            path: file.to_string(),
        })?;
        let mut items = collect_items(tree.root_node(), source, file, language);
        sort_items(&mut items);
        Ok(items)
    }

    /// Read and extract a single file; the language is taken from its extension.
    pub fn extract_file(
        &mut self,
        path: &Path,
    ) -> Result<(SourceLanguage, Vec<StructuralItem>), ExtractError> {
        let language = SourceLanguage::from_path(path)
            .ok_or_else(|| ExtractError::UnsupportedLanguage(path.to_path_buf()))?;
        let source = std::fs::read(path)
            .map_err(|source| ExtractError::Io { path: path.to_path_buf(), source })?;
        let file = path.to_string_lossy();
        let items = self.extract_source(&file, &source, language)?;
        Ok((language, items))
    }

    fn parse(&mut self, source: &[u8], language: SourceLanguage) -> Option<Tree> {
        let parser = match language {
            SourceLanguage::Rust => &mut self.rust,
            SourceLanguage::C => &mut self.c,
        };
        parser.parse(source, None)
    }
}

fn parser_for(language: SourceLanguage) -> Result<Parser, ExtractError> {
    let mut parser = Parser::new();
    parser
        .set_language(&language.tree_sitter_language())
        .map_err(|e| ExtractError::Grammar { language, message: e.to_string() })?;
    Ok(parser)
}

/// Walk `root` in pre-order and collect structural items (unsorted).
pub fn collect_items(
    root: Node<'_>,
    source: &[u8],
    file: &str,
    language: SourceLanguage,
) -> Vec<StructuralItem> {
    let mut items = Vec::new();
    let mut seen_functions: HashSet<(String, usize)> = HashSet::new();

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Some(kind) = classify_node(node, source, language) {
            let start_line = node.start_position().row + 1;
            let end_line = node.end_position().row + 1;

            if kind.is_named() {
                let text = node_text(source, node);
                match function_name(&text, language) {
                    Some(name) => {
                        let fresh = kind != ItemKind::Function
                            || seen_functions.insert((name.clone(), start_line));
                        if fresh {
                            items.push(StructuralItem {
                                file: file.to_string(),
                                kind,
                                function_name: Some(name),
                                start_line,
                                end_line,
                            });
                        }
                    }
                    None => {
                        log::debug!(
                            "Dropping unnamed {:?} at {}:{} (name pattern did not match)",
                            kind,
                            file,
                            start_line
                        );
                    }
                }
            } else {
                items.push(StructuralItem {
                    file: file.to_string(),
                    kind,
                    function_name: None,
                    start_line,
                    end_line,
                });
            }
        }

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    items
}

fn classify_node(node: Node<'_>, source: &[u8], language: SourceLanguage) -> Option<ItemKind> {
    match (language, node.kind()) {
        (SourceLanguage::Rust, "function_item") => Some(ItemKind::Function),
        (SourceLanguage::Rust, "foreign_mod_item") | (SourceLanguage::Rust, "extern_item") => {
            Some(ItemKind::ExternBlock)
        }
        (SourceLanguage::Rust, "unsafe_block") => Some(ItemKind::UnsafeBlock),
        (SourceLanguage::C, "function_definition") => Some(ItemKind::Function),
        (SourceLanguage::C, "declaration") => {
            let text = node_text(source, node);
            let is_extern = text.to_lowercase().contains("extern");
            let has_parens = text.contains('(') && text.contains(')');
            (is_extern || has_parens).then_some(ItemKind::FunctionDeclaration)
        }
        _ => None,
    }
}

fn node_text(source: &[u8], node: Node<'_>) -> String {
    String::from_utf8_lossy(&source[node.start_byte()..node.end_byte()]).into_owned()
}

/// Walk `root` recursively and extract every `.rs`, `.c` and `.h` file.
///
/// Files are visited in file-name order. A file that fails to read or parse is
/// logged and recorded in `failures`; it never stops the walk.
pub fn extract_directory(root: &Path) -> Result<DirectoryExtraction, ExtractError> {
    let mut extractor = StructuralExtractor::new()?;
    let paths = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                log::warn!("Skipping unreadable directory entry: {err}");
                None
            }
        })
        // Follows symlinks, so linked sources are extracted too.
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| SourceLanguage::from_path(path).is_some());
    Ok(extract_paths(&mut extractor, paths))
}

/// Extract each path in order, collecting per-file failures instead of stopping.
pub fn extract_paths(
    extractor: &mut StructuralExtractor,
    paths: impl IntoIterator<Item = PathBuf>,
) -> DirectoryExtraction {
    let mut out = DirectoryExtraction::default();

    for path in paths {
        match extractor.extract_file(&path) {
            Ok((language, items)) => {
                out.files_processed += 1;
                if items.is_empty() {
                    continue;
                }
                log::info!(
                    "[{}] extracted {} items ({} functions) from {}",
                    language.as_str().to_uppercase(),
                    items.len(),
                    function_count(&items),
                    path.display()
                );
                match language {
                    SourceLanguage::Rust => out.rust.extend(items),
                    SourceLanguage::C => out.c.extend(items),
                }
            }
            Err(error) => {
                log::warn!("Failed to extract {}: {error}", path.display());
                out.failures.push(FileFailure { path, error });
            }
        }
    }

    sort_items(&mut out.rust);
    sort_items(&mut out.c);
    out
}
