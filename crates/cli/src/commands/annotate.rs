use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use ffi_lens_core::config::AnnotatorConfig;
use ffi_lens_core::labels::dataset::write_annotations_csv;
use ffi_lens_core::model::{AttackClass, SourceLanguage, StructuralItem};
use ffi_lens_core::services::{class_histogram, AnnotationOutcome, Annotator, OpenAiBackend};
use serde::{Deserialize, Serialize};

use crate::{default_output_names, output_path, require_file, sha256_file};

/// Inputs of the `annotate` command; `None` fields fall back to the config file.
#[derive(Debug, Clone, Default)]
pub struct AnnotateOptions {
    pub parser_json: String,
    pub code: String,
    pub language: Option<SourceLanguage>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub config: Option<String>,
    pub output: Option<String>,
    pub csv_output: Option<String>,
    pub no_annotate: bool,
    pub max_funcs: Option<usize>,
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotateRunStatus {
    Completed,
    Degraded,
}

/// Written next to the outputs as `<stem>_run.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnnotateRunMetadata {
    pub source: String,
    pub source_hash: String,
    pub language: SourceLanguage,
    pub backend: String,
    pub model: String,
    pub functions_sent: usize,
    pub functions_total: usize,
    pub annotations: usize,
    pub status: AnnotateRunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub started_at: String,
    pub finished_at: String,
}

/// Where `annotate` put its outputs.
#[derive(Debug, Clone)]
pub struct AnnotateOutputs {
    pub annotated: Option<PathBuf>,
    pub csv: PathBuf,
    pub metadata: PathBuf,
}

/// Classify the functions of one source file and write annotated code, CSV and run metadata.
pub fn annotate_command(options: &AnnotateOptions) -> Result<AnnotateOutputs> {
    let parser_json = Path::new(&options.parser_json);
    let code_path = Path::new(&options.code);
    require_file(parser_json, "Parser JSON file")?;
    require_file(code_path, "Source code file")?;

    let mut config = AnnotatorConfig::load_or_default(options.config.as_deref().map(Path::new))?;
    if let Some(model) = &options.model {
        config.model = model.clone();
    }
    if let Some(max_funcs) = options.max_funcs {
        config.max_funcs_per_batch = max_funcs;
    }
    if let Some(dir) = &options.output_dir {
        config.output_dir = dir.clone();
    }

    let language = match options.language {
        Some(language) => language,
        None => SourceLanguage::from_path(code_path).with_context(|| {
            format!("Cannot infer language of {}; pass --language", code_path.display())
        })?,
    };

    let backend = OpenAiBackend::from_config(&config, options.api_key.as_deref())?;

    let items = load_items(parser_json)?;
    println!("Loaded {} items from {}", items.len(), parser_json.display());
    let source = fs::read_to_string(code_path)
        .with_context(|| format!("Failed to read source at {}", code_path.display()))?;

    let started_at = Utc::now().to_rfc3339();
    let annotator = Annotator::new(&backend, config.clone());
    println!("Analyzing with {} ({})...", annotator.backend_name(), backend.model());
    let outcome = annotator.analyze(&items, &source, language);
    let finished_at = Utc::now().to_rfc3339();
    println!("Identified {} functions with attack classifications", outcome.annotations.len());

    let output_dir = PathBuf::from(&config.output_dir);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output dir {}", output_dir.display()))?;
    let (annotated_name, csv_name, run_name) = default_output_names(code_path);

    let annotated = if options.no_annotate {
        None
    } else {
        let path = output_path(&output_dir, options.output.as_deref(), &annotated_name);
        fs::write(&path, &outcome.annotated_code)
            .with_context(|| format!("Failed to write annotated code at {}", path.display()))?;
        println!("Annotated code saved to: {}", path.display());
        Some(path)
    };

    let csv = output_path(&output_dir, options.csv_output.as_deref(), &csv_name);
    write_annotations_csv(&csv, &outcome.annotations)
        .with_context(|| format!("Failed to write CSV report at {}", csv.display()))?;
    println!("CSV report saved to: {}", csv.display());

    let metadata = AnnotateRunMetadata {
        source: code_path.display().to_string(),
        source_hash: sha256_file(code_path)?,
        language,
        backend: annotator.backend_name().to_string(),
        model: config.model.clone(),
        functions_sent: outcome.functions_sent,
        functions_total: outcome.functions_total,
        annotations: outcome.annotations.len(),
        status: if outcome.is_success() {
            AnnotateRunStatus::Completed
        } else {
            AnnotateRunStatus::Degraded
        },
        failure: outcome.failure.map(|kind| format!("{kind:?}")),
        started_at,
        finished_at,
    };
    let metadata_path = output_dir.join(run_name);
    fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?)
        .with_context(|| format!("Failed to write run metadata at {}", metadata_path.display()))?;

    print_summary(&outcome);

    Ok(AnnotateOutputs { annotated, csv, metadata: metadata_path })
}

fn load_items(path: &Path) -> Result<Vec<StructuralItem>> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read parser JSON at {}", path.display()))?;
    serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse parser JSON at {}", path.display()))
}

fn print_summary(outcome: &AnnotationOutcome) {
    let counts = class_histogram(&outcome.annotations);
    let rule = "=".repeat(60);

    println!();
    println!("{rule}");
    println!("ATTACK CLASSIFICATION SUMMARY");
    println!("{rule}");
    println!("Total functions analyzed: {}", outcome.annotations.len());
    if outcome.functions_total > outcome.functions_sent && outcome.functions_sent > 0 {
        println!("Functions sent: {} of {}", outcome.functions_sent, outcome.functions_total);
    }
    println!();
    println!("By attack type:");
    for class in AttackClass::ALL {
        let count = counts[class.label() as usize];
        if class == AttackClass::Safe {
            println!("  {class}: {count}");
        } else {
            println!("  {class} ({}): {count}", class.title());
        }
    }

    println!();
    println!("{rule}");
    println!("FUNCTION CLASSIFICATIONS");
    println!("{rule}");
    for annotation in &outcome.annotations {
        let label = match annotation.class() {
            Some(class) => class.to_string(),
            None => format!("Unknown ({})", annotation.attack_type),
        };
        println!("  {}: {label}", annotation.function_name);
    }
}
