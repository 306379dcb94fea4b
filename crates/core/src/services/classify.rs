use thiserror::Error;

/// System message sent with every classification request.
pub const SYSTEM_PROMPT: &str = "You are a Rust–C FFI security analysis assistant.";

/// One classification request.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
}

impl PromptRequest {
    pub fn new(user_prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: user_prompt.into(),
            temperature,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("API key not provided (set {0} or pass --api-key)")]
    MissingApiKey(String),
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },
    #[error("Response contained no message content")]
    EmptyResponse,
}

/// Coarse failure category, used only to pick diagnostic messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Quota,
    Auth,
    RateLimit,
    Other,
}

impl ClassificationError {
    /// Categorise by message content. A bare 429 counts as a quota problem.
    pub fn diagnose(&self) -> FailureKind {
        let msg = self.to_string();
        let lower = msg.to_lowercase();
        if msg.contains("insufficient_quota") || msg.contains("429") {
            FailureKind::Quota
        } else if msg.contains("401") || lower.contains("invalid_api_key") {
            FailureKind::Auth
        } else if lower.contains("rate_limit") {
            FailureKind::RateLimit
        } else {
            FailureKind::Other
        }
    }
}

impl FailureKind {
    pub fn headline(self) -> &'static str {
        match self {
            FailureKind::Quota => "QUOTA ERROR: the API quota for this account is exhausted.",
            FailureKind::Auth => "AUTHENTICATION ERROR: the API key was rejected.",
            FailureKind::RateLimit => "RATE LIMIT ERROR: too many requests.",
            FailureKind::Other => "Classification request failed.",
        }
    }

    pub fn remediation(self) -> &'static [&'static str] {
        match self {
            FailureKind::Quota => &[
                "Check account billing: https://platform.openai.com/account/billing",
                "Add a payment method or raise the quota limit",
                "Wait for the quota to reset",
            ],
            FailureKind::Auth => &[
                "Verify the API key is correct",
                "Check whether the key has expired or been revoked",
                "Create a new key at https://platform.openai.com/api-keys",
            ],
            FailureKind::RateLimit => {
                &["Wait a few minutes and try again", "Reduce the number of concurrent requests"]
            }
            FailureKind::Other => &[],
        }
    }
}

/// External classifier: prompt in, free text out.
///
/// Implementations make a single attempt; callers decide how to degrade.
pub trait ClassificationBackend {
    fn complete(&self, request: &PromptRequest) -> Result<String, ClassificationError>;
    fn name(&self) -> &str;
}
