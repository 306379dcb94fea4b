use std::cell::RefCell;

use ffi_lens_core::config::AnnotatorConfig;
use ffi_lens_core::model::{FunctionAnnotation, ItemKind, SourceLanguage, StructuralItem};
use ffi_lens_core::services::prompt::{build_analysis_prompt, ffi_summary, PromptLimits};
use ffi_lens_core::services::{
    class_histogram, Annotator, ClassificationBackend, ClassificationError, FailureKind,
    PromptRequest,
};
use pretty_assertions::assert_eq;

/// Returns a fixed response and remembers the prompts it was sent.
struct CannedBackend {
    response: String,
    seen: RefCell<Vec<PromptRequest>>,
}

impl CannedBackend {
    fn new(response: &str) -> Self {
        Self { response: response.to_string(), seen: RefCell::new(Vec::new()) }
    }
}

impl ClassificationBackend for CannedBackend {
    fn complete(&self, request: &PromptRequest) -> Result<String, ClassificationError> {
        self.seen.borrow_mut().push(request.clone());
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "canned"
    }
}

struct FailingBackend(fn() -> ClassificationError);

impl ClassificationBackend for FailingBackend {
    fn complete(&self, _request: &PromptRequest) -> Result<String, ClassificationError> {
        Err((self.0)())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

const C_SOURCE: &str = "void a(void) {\n}\n\nvoid b(void) {\n}\n\nvoid c(void) {\n}\n";

fn item(kind: ItemKind, name: Option<&str>, line: usize) -> StructuralItem {
    StructuralItem {
        file: "x.c".to_string(),
        kind,
        function_name: name.map(str::to_string),
        start_line: line,
        end_line: line,
    }
}

fn items() -> Vec<StructuralItem> {
    vec![
        item(ItemKind::Function, Some("a"), 1),
        item(ItemKind::Function, Some("b"), 4),
        item(ItemKind::Function, Some("c"), 7),
        item(ItemKind::FunctionDeclaration, Some("rust_cb"), 9),
        item(ItemKind::ExternBlock, None, 10),
    ]
}

#[test]
fn canned_response_is_parsed_into_annotations() {
    let backend = CannedBackend::new(
        "===== BEGIN ANNOTATED CODE =====\n/* a */\nvoid a(void) {\n}\n\
         ===== BEGIN CSV =====\nfunction_name,attack_type\na,5\nb,0\n",
    );
    let annotator = Annotator::new(&backend, AnnotatorConfig::default());

    let outcome = annotator.analyze(&items(), C_SOURCE, SourceLanguage::C);

    assert!(outcome.is_success());
    assert_eq!(outcome.annotated_code, "/* a */\nvoid a(void) {\n}");
    assert_eq!(
        outcome.annotations,
        vec![FunctionAnnotation::new("a", 5), FunctionAnnotation::new("b", 0)]
    );
    assert_eq!((outcome.functions_sent, outcome.functions_total), (3, 3));

    let seen = backend.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!((seen[0].temperature - 0.3).abs() < f32::EPSILON);
    assert!(seen[0].system_prompt.contains("FFI security analysis assistant"));
}

#[test]
fn batch_limits_source_and_items() {
    let backend = CannedBackend::new("nothing useful");
    let config = AnnotatorConfig { max_funcs_per_batch: 2, ..AnnotatorConfig::default() };
    let annotator = Annotator::new(&backend, config);

    let outcome = annotator.analyze(&items(), C_SOURCE, SourceLanguage::C);
    assert_eq!((outcome.functions_sent, outcome.functions_total), (2, 3));
    assert!(outcome.annotations.is_empty());
    assert_eq!(outcome.annotated_code, "nothing useful");

    let prompt = &backend.seen.borrow()[0].user_prompt;
    assert!(prompt.contains("void a(void) {\n}\n\nvoid b(void) {\n}"));
    assert!(!prompt.contains("void c(void)"));
    assert!(prompt.contains("\"function_name\": \"b\""));
    assert!(!prompt.contains("\"function_name\": \"c\""));
    // Unnamed items always travel with the batch.
    assert!(prompt.contains("\"type\": \"extern_block\""));
}

#[test]
fn unsliceable_source_is_sent_whole() {
    let backend = CannedBackend::new("x");
    let annotator = Annotator::new(&backend, AnnotatorConfig::default());
    let source = "char *f(void) { return 0; }\n";

    let outcome = annotator.analyze(&items(), source, SourceLanguage::C);
    assert_eq!((outcome.functions_sent, outcome.functions_total), (0, 0));

    let prompt = &backend.seen.borrow()[0].user_prompt;
    assert!(prompt.contains(source.trim_end()));
    assert!(prompt.contains("\"function_name\": \"c\""));
}

#[test]
fn failed_call_degrades_to_original_source() {
    let backend = FailingBackend(|| ClassificationError::Api {
        status: 429,
        body: "{\"error\":{\"code\":\"insufficient_quota\"}}".to_string(),
    });
    let annotator = Annotator::new(&backend, AnnotatorConfig::default());

    let outcome = annotator.analyze(&items(), C_SOURCE, SourceLanguage::C);
    assert!(!outcome.is_success());
    assert_eq!(outcome.failure, Some(FailureKind::Quota));
    assert_eq!(outcome.annotated_code, C_SOURCE);
    assert!(outcome.annotations.is_empty());
}

#[test]
fn failures_are_diagnosed_by_message() {
    let api = |status, body: &str| ClassificationError::Api { status, body: body.to_string() };
    assert_eq!(api(429, "slow down").diagnose(), FailureKind::Quota);
    assert_eq!(api(401, "nope").diagnose(), FailureKind::Auth);
    assert_eq!(api(400, "Invalid_API_Key").diagnose(), FailureKind::Auth);
    assert_eq!(api(400, "rate_limit_exceeded").diagnose(), FailureKind::RateLimit);
    assert_eq!(ClassificationError::Transport("timed out".into()).diagnose(), FailureKind::Other);
    assert_eq!(ClassificationError::EmptyResponse.diagnose(), FailureKind::Other);

    assert!(!FailureKind::Quota.remediation().is_empty());
    assert!(FailureKind::Other.remediation().is_empty());
}

#[test]
fn prompt_carries_markers_summary_and_truncated_source() {
    let source = "x".repeat(100);
    let limits = PromptLimits { max_items: 2, max_source_chars: 10 };
    let prompt = build_analysis_prompt(&items(), &source, SourceLanguage::Rust, limits);

    assert!(prompt.contains("===== BEGIN ANNOTATED CODE ====="));
    assert!(prompt.contains("===== BEGIN CSV ====="));
    assert!(prompt.contains("function_name,attack_type"));
    assert!(prompt.contains("Raw RUST source:"));
    assert!(prompt.contains("```rust\nxxxxxxxxxx\n```"));
    assert!(!prompt.contains(&"x".repeat(11)));
    // Only the first two items are included, so no FFI items are summarised.
    assert!(prompt.contains("None explicitly detected."));
    assert!(!prompt.contains("\"function_name\": \"c\""));
}

#[test]
fn prompt_limits_follow_config() {
    let config =
        AnnotatorConfig { max_parser_items: 7, max_source_chars: 120, ..Default::default() };
    assert_eq!(PromptLimits::from(&config), PromptLimits { max_items: 7, max_source_chars: 120 });
}

#[test]
fn ffi_summary_lists_sorted_distinct_names_and_counts() {
    let items = vec![
        item(ItemKind::FunctionDeclaration, Some("zeta"), 1),
        item(ItemKind::FunctionDeclaration, Some("alpha"), 2),
        item(ItemKind::FunctionDeclaration, Some("zeta"), 3),
        item(ItemKind::ExternBlock, None, 4),
        item(ItemKind::UnsafeBlock, None, 5),
        item(ItemKind::UnsafeBlock, None, 6),
        item(ItemKind::Function, Some("plain"), 7),
    ];
    assert_eq!(
        ffi_summary(&items),
        "- FFI-relevant functions: alpha, zeta\n- Extern/FFI blocks: 1\n- Unsafe blocks: 2"
    );
    assert_eq!(ffi_summary(&[]), "None explicitly detected.");
}

#[test]
fn histogram_counts_per_class() {
    let annotations = vec![
        FunctionAnnotation::new("a", 0),
        FunctionAnnotation::new("b", 5),
        FunctionAnnotation::new("c", 5),
        FunctionAnnotation::new("d", 9),
    ];
    assert_eq!(class_histogram(&annotations), [1, 0, 0, 0, 0, 2]);
}
