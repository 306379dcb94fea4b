use std::collections::BTreeSet;

use crate::config::AnnotatorConfig;
use crate::model::{FunctionAnnotation, SourceLanguage, StructuralItem, CLASS_COUNT};
use crate::response::{parse_annotation_rows, split_response};
use crate::services::classify::{ClassificationBackend, FailureKind, PromptRequest};
use crate::services::prompt::{build_analysis_prompt, PromptLimits};
use crate::slicer::{select_batch, slice_functions};

/// Result of one annotate run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationOutcome {
    /// Annotated source from the model, or the original source on failure.
    pub annotated_code: String,
    pub annotations: Vec<FunctionAnnotation>,
    /// Functions included in the request (0 when the whole source was sent unsliced).
    pub functions_sent: usize,
    /// Functions the slicer found in the source.
    pub functions_total: usize,
    /// Set when the classification call failed.
    pub failure: Option<FailureKind>,
}

impl AnnotationOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Sends a batch of source to a classification backend and parses the reply.
pub struct Annotator<'a> {
    backend: &'a dyn ClassificationBackend,
    config: AnnotatorConfig,
}

impl<'a> Annotator<'a> {
    pub fn new(backend: &'a dyn ClassificationBackend, config: AnnotatorConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Classify the functions of `source`.
    ///
    /// Never fails: a failed call yields the original source and no annotations.
    pub fn analyze(
        &self,
        items: &[StructuralItem],
        source: &str,
        language: SourceLanguage,
    ) -> AnnotationOutcome {
        let slices = slice_functions(source, language);
        let functions_total = slices.len();

        let (batch_source, batch_items, functions_sent) = if slices.is_empty() {
            log::info!("No functions detected by the slicer; sending the whole source");
            (source.to_string(), items.to_vec(), 0)
        } else {
            let batch = select_batch(&slices, self.config.max_funcs_per_batch);
            if batch.len() < slices.len() {
                log::info!(
                    "Sending {} of {} functions; the rest are not classified in this run",
                    batch.len(),
                    slices.len()
                );
            }
            let names: BTreeSet<&str> = batch.iter().map(|s| s.name.as_str()).collect();
            let code = batch.iter().map(|s| s.body_text.as_str()).collect::<Vec<_>>().join("\n\n");
            let kept = items
                .iter()
                .filter(|item| item.function_name.as_deref().map_or(true, |n| names.contains(n)))
                .cloned()
                .collect();
            (code, kept, batch.len())
        };

        let limits = PromptLimits::from(&self.config);
        let prompt = build_analysis_prompt(&batch_items, &batch_source, language, limits);
        let request = PromptRequest::new(prompt, self.config.temperature);

        match self.backend.complete(&request) {
            Ok(text) => {
                let parsed = split_response(&text);
                let annotations = parse_annotation_rows(&parsed.table);
                log::info!(
                    "Parsed {} annotations from {} response",
                    annotations.len(),
                    self.backend.name()
                );
                AnnotationOutcome {
                    annotated_code: parsed.annotated,
                    annotations,
                    functions_sent,
                    functions_total,
                    failure: None,
                }
            }
            Err(err) => {
                let kind = err.diagnose();
                log::error!("{}", kind.headline());
                log::error!("{} call failed: {err}", self.backend.name());
                for hint in kind.remediation() {
                    log::error!("  - {hint}");
                }
                log::warn!("Continuing without annotations");
                AnnotationOutcome {
                    annotated_code: source.to_string(),
                    annotations: Vec::new(),
                    functions_sent,
                    functions_total,
                    failure: Some(kind),
                }
            }
        }
    }
}

/// Count annotations per class; labels outside 0..=5 are ignored.
pub fn class_histogram(annotations: &[FunctionAnnotation]) -> [usize; CLASS_COUNT] {
    let mut counts = [0; CLASS_COUNT];
    for a in annotations {
        if let Some(slot) = counts.get_mut(a.attack_type as usize) {
            *slot += 1;
        }
    }
    counts
}
