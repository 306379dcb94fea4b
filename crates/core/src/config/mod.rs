use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::slicer::DEFAULT_MAX_FUNCS_PER_BATCH;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_OUTPUT_DIR: &str = "llm_output";

/// Settings for the annotate pipeline.
///
/// Loaded from YAML or JSON (chosen by file extension); every field is optional
/// in the file and falls back to the defaults below. CLI flags override it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Chat model name sent with each request.
    pub model: String,
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: f32,
    /// Functions per classification request; extra functions are not sent.
    pub max_funcs_per_batch: usize,
    /// Structural items included in the prompt.
    pub max_parser_items: usize,
    /// Characters of source included in the prompt.
    pub max_source_chars: usize,
    /// Directory receiving annotated code, CSV and run metadata.
    pub output_dir: String,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            temperature: 0.3,
            max_funcs_per_batch: DEFAULT_MAX_FUNCS_PER_BATCH,
            max_parser_items: 50,
            max_source_chars: 8000,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}

impl AnnotatorConfig {
    /// Load a config file (`.json`, otherwise YAML).
    pub fn load(path: &Path) -> Result<Self> {
        let body = std::fs::read(path)
            .with_context(|| format!("Failed to read annotator config at {}", path.display()))?;
        let config = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_slice(&body).context("Failed to parse annotator config JSON")?
        } else {
            serde_yaml::from_slice(&body).context("Failed to parse annotator config YAML")?
        };
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Resolve the API key: explicit value first, then the configured env var.
    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}
