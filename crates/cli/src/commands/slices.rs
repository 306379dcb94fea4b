use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ffi_lens_core::model::SourceLanguage;
use ffi_lens_core::slicer::{select_batch, slice_functions};
use serde::Serialize;

use crate::require_file;

#[derive(Debug, Serialize)]
struct SliceRow<'a> {
    name: &'a str,
    start_line: usize,
    end_line: usize,
    in_batch: bool,
}

/// List the function slices detected in `code` and which ones fit in one batch.
pub fn slices_command(
    code: &str,
    language: SourceLanguage,
    max_funcs: usize,
    json: bool,
) -> Result<()> {
    let path = Path::new(code);
    require_file(path, "Source code file")?;
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read source at {}", path.display()))?;

    let slices = slice_functions(&source, language);
    let batch_len = select_batch(&slices, max_funcs).len();
    let rows: Vec<SliceRow> = slices
        .iter()
        .enumerate()
        .map(|(i, s)| SliceRow {
            name: &s.name,
            start_line: s.start_line,
            end_line: s.end_line,
            in_batch: i < batch_len,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Function slices in {} ({language}):", path.display());
    if rows.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for row in &rows {
        let marker = if row.in_batch { "*" } else { " " };
        println!("{marker} {} (lines {}-{})", row.name, row.start_line, row.end_line);
    }
    println!();
    println!(
        "{} of {} functions fit in one batch (max {})",
        batch_len,
        rows.len(),
        max_funcs.max(1)
    );

    Ok(())
}
