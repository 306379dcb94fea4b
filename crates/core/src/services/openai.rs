use serde::{Deserialize, Serialize};

use crate::config::AnnotatorConfig;
use crate::services::classify::{ClassificationBackend, ClassificationError, PromptRequest};

/// Chat-completions client over blocking reqwest. One request per call, no retry.
pub struct OpenAiBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiBackend {
    pub fn new(endpoint: &str, model: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Build from config, resolving the key from `explicit_key` or the configured env var.
    pub fn from_config(
        config: &AnnotatorConfig,
        explicit_key: Option<&str>,
    ) -> Result<Self, ClassificationError> {
        let api_key = config
            .resolve_api_key(explicit_key)
            .ok_or_else(|| ClassificationError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(&config.endpoint, &config.model, &api_key))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ClassificationBackend for OpenAiBackend {
    fn complete(&self, request: &PromptRequest) -> Result<String, ClassificationError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &request.system_prompt },
                ChatMessage { role: "user", content: &request.user_prompt },
            ],
            temperature: request.temperature,
        };

        log::debug!("POST {} (model {})", self.endpoint, self.model);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| ClassificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassificationError::Api {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let parsed: ChatResponse =
            response.json().map_err(|e| ClassificationError::Transport(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ClassificationError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
