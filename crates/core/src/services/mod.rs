//! Classification services: the external model call and the batching
//! annotator that prepares its input and parses its output.

pub mod annotator;
pub mod classify;
pub mod openai;
pub mod prompt;

pub use annotator::{class_histogram, AnnotationOutcome, Annotator};
pub use classify::{ClassificationBackend, ClassificationError, FailureKind, PromptRequest};
pub use openai::OpenAiBackend;
