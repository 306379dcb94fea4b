use std::fs;
use std::path::Path;

use ffi_lens::{default_output_names, output_path, require_file, sha256_file};
use tempfile::tempdir;

#[test]
fn default_names_follow_source_stem_and_extension() {
    let (annotated, csv, run) = default_output_names(Path::new("testsets/all_attacks.rs"));
    assert_eq!(annotated, "all_attacks_annotated.rs");
    assert_eq!(csv, "all_attacks_annotations.csv");
    assert_eq!(run, "all_attacks_run.json");

    let (annotated, _, _) = default_output_names(Path::new("Makefile"));
    assert_eq!(annotated, "Makefile_annotated");
}

#[test]
fn requested_output_names_are_reduced_to_file_name() {
    let out = Path::new("llm_output");
    assert_eq!(output_path(out, Some("../elsewhere/custom.c"), "x.c"), out.join("custom.c"));
    assert_eq!(output_path(out, None, "x.c"), out.join("x.c"));
}

#[test]
fn require_file_rejects_missing_and_directories() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("present.txt");
    fs::write(&file, "x").unwrap();

    assert!(require_file(&file, "Input").is_ok());
    let err = require_file(&dir.path().join("absent.txt"), "Input").unwrap_err();
    assert!(err.to_string().starts_with("Input not found"));
    assert!(require_file(dir.path(), "Input").is_err());
}

#[test]
fn sha256_matches_known_digest() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("abc.txt");
    fs::write(&file, "abc").unwrap();
    assert_eq!(
        sha256_file(&file).unwrap(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}
