use std::fs;

use ffi_lens_core::extract::{
    extract_directory, extract_paths, function_count, ExtractError, StructuralExtractor,
};
use ffi_lens_core::model::{ItemKind, SourceLanguage, StructuralItem};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const RUST_SOURCE: &str = r#"extern "C" {
    fn c_write(ptr: *mut u8, len: usize);
}

pub extern "C" fn rust_cb(x: i64) -> i64 {
    x + 1
}

fn generic<T>(v: T) -> T {
    v
}

fn caller() {
    let mut buf = [0u8; 4];
    unsafe {
        c_write(buf.as_mut_ptr(), 8);
    }
}
"#;

const C_SOURCE: &str = r#"#include <stdint.h>

extern void rust_callback(int64_t value);
int64_t counter = 0;

static int64_t helper(int64_t *p) {
    return *p;
}

void run(void) {
    int64_t local = helper(&counter);
    rust_callback(local);
}
"#;

fn item(kind: ItemKind, name: Option<&str>, start: usize, end: usize) -> StructuralItem {
    StructuralItem {
        file: "src.x".to_string(),
        kind,
        function_name: name.map(str::to_string),
        start_line: start,
        end_line: end,
    }
}

#[test]
fn rust_items_are_extracted_and_generic_fn_dropped() {
    let mut extractor = StructuralExtractor::new().expect("grammars load");
    let items = extractor
        .extract_source("src.x", RUST_SOURCE.as_bytes(), SourceLanguage::Rust)
        .expect("parse rust");

    assert_eq!(
        items,
        vec![
            item(ItemKind::ExternBlock, None, 1, 3),
            item(ItemKind::Function, Some("rust_cb"), 5, 7),
            item(ItemKind::Function, Some("caller"), 13, 18),
            item(ItemKind::UnsafeBlock, None, 15, 17),
        ]
    );
    assert!(items.iter().all(|i| i.function_name.as_deref() != Some("generic")));
    assert_eq!(function_count(&items), 2);
}

#[test]
fn c_items_include_declarations() {
    let mut extractor = StructuralExtractor::new().expect("grammars load");
    let items = extractor
        .extract_source("src.x", C_SOURCE.as_bytes(), SourceLanguage::C)
        .expect("parse c");

    assert_eq!(
        items,
        vec![
            item(ItemKind::FunctionDeclaration, Some("rust_callback"), 3, 3),
            item(ItemKind::Function, Some("helper"), 6, 8),
            item(ItemKind::Function, Some("run"), 10, 13),
            // A local initialised from a call is a declaration with parentheses.
            item(ItemKind::FunctionDeclaration, Some("helper"), 11, 11),
        ]
    );
}

#[test]
fn items_serialize_to_the_persisted_shape() {
    let unnamed = serde_json::to_value(item(ItemKind::ExternBlock, None, 1, 3)).unwrap();
    assert_eq!(
        unnamed,
        serde_json::json!({"file": "src.x", "type": "extern_block", "start_line": 1, "end_line": 3})
    );

    let named = serde_json::to_value(item(ItemKind::FunctionDeclaration, Some("f"), 2, 2)).unwrap();
    assert_eq!(named["type"], "function_declaration");
    assert_eq!(named["function_name"], "f");

    let back: StructuralItem = serde_json::from_value(unnamed).unwrap();
    assert_eq!(back.kind, ItemKind::ExternBlock);
    assert_eq!(back.function_name, None);
}

#[test]
fn extract_file_rejects_unknown_extensions_and_missing_files() {
    let dir = tempdir().unwrap();
    let mut extractor = StructuralExtractor::new().unwrap();

    let txt = dir.path().join("notes.txt");
    fs::write(&txt, "fn main() {}").unwrap();
    assert!(matches!(extractor.extract_file(&txt), Err(ExtractError::UnsupportedLanguage(_))));

    let missing = dir.path().join("missing.rs");
    assert!(matches!(extractor.extract_file(&missing), Err(ExtractError::Io { .. })));
}

#[test]
fn directory_walk_splits_languages_and_sorts() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("nested")).unwrap();
    fs::write(root.join("b.rs"), RUST_SOURCE).unwrap();
    fs::write(root.join("a.rs"), "fn first() {}\n").unwrap();
    fs::write(root.join("nested/lib.c"), C_SOURCE).unwrap();
    fs::write(root.join("nested/api.h"), "extern int api_call(int x);\n").unwrap();
    fs::write(root.join("README.md"), "# not source\n").unwrap();

    let extraction = extract_directory(root).expect("walk");

    assert_eq!(extraction.files_processed, 4);
    assert!(extraction.failures.is_empty());

    let rust = extraction.items(SourceLanguage::Rust);
    assert_eq!(rust.len(), 5);
    assert!(rust[0].file.ends_with("a.rs"));
    assert_eq!(rust[0].function_name.as_deref(), Some("first"));
    assert!(rust[1..].iter().all(|i| i.file.ends_with("b.rs")));
    assert_eq!(function_count(rust), 3);

    let c = extraction.items(SourceLanguage::C);
    assert!(c[0].file.ends_with("api.h"));
    assert_eq!(c[0].function_name.as_deref(), Some("api_call"));
    assert!(c.windows(2).all(|w| (&w[0].file, w[0].start_line) <= (&w[1].file, w[1].start_line)));
    assert_eq!(function_count(c), 2);
}

#[test]
fn unreadable_file_is_recorded_and_walk_continues() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.rs");
    let missing = dir.path().join("missing.rs");
    let last = dir.path().join("last.c");
    fs::write(&first, "fn first() {}\n").unwrap();
    fs::write(&last, "int last(void) { return 0; }\n").unwrap();

    let mut extractor = StructuralExtractor::new().unwrap();
    let extraction = extract_paths(&mut extractor, vec![first, missing.clone(), last]);

    assert_eq!(extraction.files_processed, 2);
    assert_eq!(extraction.failures.len(), 1);
    assert_eq!(extraction.failures[0].path, missing);
    assert!(matches!(extraction.failures[0].error, ExtractError::Io { .. }));

    let rust = extraction.items(SourceLanguage::Rust);
    assert_eq!(rust.len(), 1);
    assert_eq!(rust[0].function_name.as_deref(), Some("first"));
    let c = extraction.items(SourceLanguage::C);
    assert_eq!(c.len(), 1);
    assert_eq!(c[0].function_name.as_deref(), Some("last"));
}

#[test]
fn same_function_on_one_line_is_emitted_once() {
    let mut extractor = StructuralExtractor::new().unwrap();
    let items = extractor
        .extract_source("src.x", b"fn a() {} fn a() {}\n", SourceLanguage::Rust)
        .unwrap();
    assert_eq!(items, vec![item(ItemKind::Function, Some("a"), 1, 1)]);
}

#[test]
fn repeated_c_declarations_on_one_line_are_all_kept() {
    let mut extractor = StructuralExtractor::new().unwrap();
    let items = extractor
        .extract_source("x.h", b"int a(void); int a(void);\n", SourceLanguage::C)
        .unwrap();
    let declarations: Vec<_> =
        items.iter().filter(|i| i.kind == ItemKind::FunctionDeclaration).collect();
    assert_eq!(declarations.len(), 2);
    assert!(declarations.iter().all(|i| i.function_name.as_deref() == Some("a")));
}

#[cfg(unix)]
#[test]
fn directory_walk_follows_symlinked_sources() {
    let dir = tempdir().unwrap();
    let target_dir = tempdir().unwrap();
    let target = target_dir.path().join("real.rs");
    fs::write(&target, "fn linked() {}\n").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("link.rs")).unwrap();

    let extraction = extract_directory(dir.path()).expect("walk");

    assert_eq!(extraction.files_processed, 1);
    let rust = extraction.items(SourceLanguage::Rust);
    assert_eq!(rust.len(), 1);
    assert_eq!(rust[0].function_name.as_deref(), Some("linked"));
}
