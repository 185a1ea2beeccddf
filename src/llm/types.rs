//! LLM types: provider-neutral messages, responses, and errors.

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by gateway client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The HTTP request to the gateway failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The gateway returned a non-success HTTP status.
    #[error("AI gateway error: {status}")]
    ApiResponse { status: u16, body: String },

    /// The gateway response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl LlmError {
    /// HTTP status returned by the gateway, if the call got that far.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiResponse { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// MESSAGE TYPES
// =============================================================================

/// A single message in a transcript sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

/// Response from a gateway completion call.
#[derive(Debug, Default)]
pub struct ChatResponse {
    /// Text of the first completion; `None` when the model returned no text.
    pub text: Option<String>,
    /// Image references (data URLs or remote URLs) attached to the first completion.
    pub images: Vec<String>,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

// =============================================================================
// LLM CHAT TRAIT
// =============================================================================

/// Provider-neutral async trait for the AI gateway. Enables mocking in tests.
#[async_trait::async_trait]
pub trait LlmChat: Send + Sync {
    /// Send a system prompt and transcript to the chat model.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails or the response is malformed.
    async fn chat(&self, system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError>;

    /// Ask the image-capable model to render `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails or the response is malformed.
    async fn generate_image(&self, prompt: &str) -> Result<ChatResponse, LlmError>;
}
