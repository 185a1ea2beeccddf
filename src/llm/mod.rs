//! LLM: AI gateway adapter for chat and image generation.
//!
//! DESIGN
//! ======
//! The gateway speaks the OpenAI chat-completions dialect for both text and
//! image output. `LlmClient` pairs the HTTP client with the configured chat
//! and image model names and implements [`LlmChat`], which is the seam
//! services depend on.

pub mod config;
pub mod gateway;
pub mod types;

use config::LlmConfig;
pub use types::LlmChat;
use types::{ChatResponse, LlmError, Message};

// =============================================================================
// CLIENT
// =============================================================================

/// Concrete gateway client configured from environment variables by
/// [`LlmClient::from_env`].
pub struct LlmClient {
    inner: gateway::GatewayClient,
    chat_model: String,
    image_model: String,
}

impl LlmClient {
    /// Build a gateway client from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        let config = LlmConfig::from_env()?;
        Self::from_config(config)
    }

    /// Build a gateway client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let inner = gateway::GatewayClient::new(config.api_key, config.base_url, config.timeouts)?;
        Ok(Self { inner, chat_model: config.chat_model, image_model: config.image_model })
    }

    #[must_use]
    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    #[must_use]
    pub fn image_model(&self) -> &str {
        &self.image_model
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn chat(&self, system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        self.inner
            .chat_completions(&self.chat_model, system, messages)
            .await
    }

    async fn generate_image(&self, prompt: &str) -> Result<ChatResponse, LlmError> {
        self.inner
            .image_completions(&self.image_model, prompt)
            .await
    }
}
