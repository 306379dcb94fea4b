use std::fs;
use std::path::Path;

use predicates::prelude::*;
use tempfile::tempdir;

const C_SOURCE: &str = "void a(void) {\n}\n\nvoid b(void) {\n}\n";
const PARSER_JSON: &str = r#"[
  {"file": "lib.c", "type": "function", "function_name": "a", "start_line": 1, "end_line": 2},
  {"file": "lib.c", "type": "function", "function_name": "b", "start_line": 4, "end_line": 5}
]"#;

/// Lays out inputs plus a config whose endpoint refuses connections.
fn fixture(root: &Path) {
    fs::write(root.join("lib.c"), C_SOURCE).unwrap();
    fs::write(root.join("c_snippets.json"), PARSER_JSON).unwrap();
    fs::write(
        root.join("annotator.yaml"),
        "endpoint: http://127.0.0.1:9/v1/chat/completions\nmodel: test-model\n",
    )
    .unwrap();
}

#[test]
fn unreachable_backend_degrades_and_still_writes_outputs() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fixture(root);

    assert_cmd::cargo::cargo_bin_cmd!("ffi-lens")
        .current_dir(root)
        .args([
            "annotate",
            "--parser-json",
            "c_snippets.json",
            "--code",
            "lib.c",
            "--language",
            "c",
            "--api-key",
            "sk-test",
            "--config",
            "annotator.yaml",
            "--output-dir",
            "out",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ATTACK CLASSIFICATION SUMMARY"))
        .stdout(predicate::str::contains("Total functions analyzed: 0"));

    let out = root.join("out");
    assert_eq!(fs::read_to_string(out.join("lib_annotated.c")).unwrap(), C_SOURCE);
    assert_eq!(
        fs::read_to_string(out.join("lib_annotations.csv")).unwrap(),
        "function_name,attack_type\n"
    );

    let run: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("lib_run.json")).unwrap()).unwrap();
    assert_eq!(run["status"], "degraded");
    assert_eq!(run["model"], "test-model");
    assert_eq!(run["backend"], "openai");
    assert_eq!(run["language"], "c");
    assert_eq!(run["functions_sent"], 2);
    assert_eq!(run["functions_total"], 2);
    assert_eq!(run["source_hash"].as_str().unwrap().len(), 64);
    assert!(run["started_at"].as_str().unwrap().contains('T'));
}

#[test]
fn custom_names_land_in_output_dir_and_no_annotate_skips_code() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fixture(root);

    assert_cmd::cargo::cargo_bin_cmd!("ffi-lens")
        .current_dir(root)
        .args([
            "annotate",
            "--parser-json",
            "c_snippets.json",
            "--code",
            "lib.c",
            "--language",
            "c",
            "--api-key",
            "sk-test",
            "--config",
            "annotator.yaml",
            "--output-dir",
            "out",
            "--csv-output",
            "elsewhere/preds.csv",
            "--no-annotate",
        ])
        .assert()
        .success();

    let out = root.join("out");
    assert!(out.join("preds.csv").is_file());
    assert!(!root.join("elsewhere").exists());
    assert!(!out.join("lib_annotated.c").exists());
    assert!(out.join("lib_run.json").is_file());
}

#[test]
fn missing_inputs_fail_before_any_work() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fixture(root);

    assert_cmd::cargo::cargo_bin_cmd!("ffi-lens")
        .current_dir(root)
        .args(["annotate", "--parser-json", "nope.json", "--code", "lib.c", "--language", "c"])
        .args(["--api-key", "sk-test", "--output-dir", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parser JSON file not found"));

    assert_cmd::cargo::cargo_bin_cmd!("ffi-lens")
        .current_dir(root)
        .args(["annotate", "--parser-json", "c_snippets.json", "--code", "nope.c"])
        .args(["--language", "c"])
        .args(["--api-key", "sk-test", "--output-dir", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source code file not found"));

    assert!(!root.join("out").exists());
}

#[test]
fn missing_api_key_is_fatal() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fixture(root);
    fs::write(root.join("annotator.yaml"), "api_key_env: FFI_LENS_CLI_TEST_UNSET_KEY\n").unwrap();

    assert_cmd::cargo::cargo_bin_cmd!("ffi-lens")
        .current_dir(root)
        .env_remove("FFI_LENS_CLI_TEST_UNSET_KEY")
        .args(["annotate", "--parser-json", "c_snippets.json", "--code", "lib.c"])
        .args(["--language", "c"])
        .args(["--config", "annotator.yaml", "--output-dir", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key not provided"))
        .stderr(predicate::str::contains("FFI_LENS_CLI_TEST_UNSET_KEY"));
}
