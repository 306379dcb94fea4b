use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ffi_lens_core::extract::{extract_directory, function_count};
use ffi_lens_core::model::{SourceLanguage, StructuralItem};

/// Walk `src`, extract structural items, and write one JSON array per language.
pub fn extract_command(src: &str, rust_out: &str, c_out: &str) -> Result<()> {
    let root = Path::new(src);
    if !root.is_dir() {
        return Err(anyhow!("Source directory not found: {}", root.display()));
    }

    let extraction = extract_directory(root)
        .with_context(|| format!("Failed to extract from {}", root.display()))?;

    write_items(Path::new(rust_out), &extraction.rust)?;
    write_items(Path::new(c_out), &extraction.c)?;

    println!(
        "Processed {} files ({} skipped)",
        extraction.files_processed,
        extraction.failures.len()
    );
    println!("Wrote {} rust items -> {}", extraction.rust.len(), rust_out);
    println!("Wrote {} c items -> {}", extraction.c.len(), c_out);
    println!();
    for language in [SourceLanguage::Rust, SourceLanguage::C] {
        let items = extraction.items(language);
        println!("{language}: {} functions extracted", function_count(items));
    }

    Ok(())
}

fn write_items(path: &Path, items: &[StructuralItem]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output dir {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(items)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
