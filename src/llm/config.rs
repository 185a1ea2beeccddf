//! AI gateway configuration parsed from environment variables.

use super::types::LlmError;

pub const DEFAULT_GATEWAY_BASE_URL: &str = "https://ai.gateway.lovable.dev/v1";
pub const DEFAULT_API_KEY_ENV: &str = "AI_GATEWAY_API_KEY";
pub const DEFAULT_CHAT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "google/gemini-2.5-flash-image-preview";
pub const DEFAULT_LLM_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LLM_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub image_model: String,
    pub timeouts: LlmTimeouts,
}

impl LlmConfig {
    /// Build typed gateway config from environment variables.
    ///
    /// Required:
    /// - the API key, read from the variable named by `AI_GATEWAY_API_KEY_ENV`
    ///   (`AI_GATEWAY_API_KEY` when unset)
    ///
    /// Optional:
    /// - `AI_GATEWAY_BASE_URL`: OpenAI-compatible base URL
    /// - `AI_CHAT_MODEL`, `AI_IMAGE_MODEL`
    /// - `AI_REQUEST_TIMEOUT_SECS`: default 120
    /// - `AI_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or blank, or the base URL is
    /// not http(s).
    pub fn from_env() -> Result<Self, LlmError> {
        let key_var = std::env::var("AI_GATEWAY_API_KEY_ENV").unwrap_or_else(|_| DEFAULT_API_KEY_ENV.to_string());
        let api_key = std::env::var(&key_var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey { var: key_var.clone() })?;

        let base_url = std::env::var("AI_GATEWAY_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GATEWAY_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(LlmError::ConfigParse(format!("AI_GATEWAY_BASE_URL must be an http(s) URL: {base_url}")));
        }

        let chat_model = std::env::var("AI_CHAT_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());
        let image_model = std::env::var("AI_IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string());
        let timeouts = LlmTimeouts {
            request_secs: env_parse_u64("AI_REQUEST_TIMEOUT_SECS", DEFAULT_LLM_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("AI_CONNECT_TIMEOUT_SECS", DEFAULT_LLM_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_key, base_url, chat_model, image_model, timeouts })
    }
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
