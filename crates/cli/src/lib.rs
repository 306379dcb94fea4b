use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};

pub mod commands;

/// Fail early when a required input file is missing.
pub fn require_file(path: &Path, what: &str) -> Result<()> {
    if !path.is_file() {
        return Err(anyhow!("{what} not found: {}", path.display()));
    }
    Ok(())
}

/// Place an output file inside `output_dir`.
///
/// A user-provided name is reduced to its final component; otherwise
/// `default_name` is used.
pub fn output_path(output_dir: &Path, requested: Option<&str>, default_name: &str) -> PathBuf {
    let name = requested
        .and_then(|r| Path::new(r).file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| default_name.to_string());
    output_dir.join(name)
}

/// Default output names derived from the source file:
/// `<stem>_annotated<.ext>`, `<stem>_annotations.csv`, `<stem>_run.json`.
pub fn default_output_names(code_path: &Path) -> (String, String, String) {
    let stem = code_path.file_stem().and_then(|s| s.to_str()).unwrap_or("source");
    let ext = code_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    (
        format!("{stem}_annotated{ext}"),
        format!("{stem}_annotations.csv"),
        format!("{stem}_run.json"),
    )
}

/// Compute the SHA-256 hash of a file and return it as a hex string.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open source for hashing: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read source for hashing: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
