//! HTTP client for the creative hub server.
//!
//! The chat call goes to one configurable endpoint under a [`RetryPolicy`]:
//! a fixed number of attempts with a fixed pause between them. Everything
//! else is a single request.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("missing user id; pass --user-id or set HUB_USER_ID")]
    MissingUserId,
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("a message is already being sent")]
    Busy,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Transport failures, 5xx answers, and 2xx answers without a usable
    /// reply are worth another attempt. Client errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::MissingField(_) | Self::InvalidJson(_) => true,
            Self::ServerError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

// =============================================================================
// RETRY POLICY
// =============================================================================

pub const DEFAULT_CHAT_ATTEMPTS: u32 = 2;
pub const DEFAULT_CHAT_RETRY_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: DEFAULT_CHAT_ATTEMPTS, delay: Duration::from_millis(DEFAULT_CHAT_RETRY_DELAY_MS) }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up. `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, CliError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, CliError>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < attempts && error.is_retryable() => {
                    eprintln!("attempt {attempt}/{attempts} failed: {error}; retrying");
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ThreadMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationThread {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<ThreadMessage>,
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HubClient {
    http: reqwest::Client,
    base_url: String,
    chat_url: String,
    retry: RetryPolicy,
}

impl HubClient {
    /// Build a client. `chat_url` defaults to `<base_url>/chat-with-ai`.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is not http(s).
    pub fn new(base_url: &str, chat_url: Option<&str>, retry: RetryPolicy) -> Result<Self, CliError> {
        let base_url = validate_url(base_url)?;
        let chat_url = match chat_url {
            Some(url) => validate_url(url)?,
            None => format!("{base_url}/chat-with-ai"),
        };
        Ok(Self { http: reqwest::Client::new(), base_url, chat_url, retry })
    }

    #[must_use]
    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    async fn request_json(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<Value>,
    ) -> Result<Value, CliError> {
        let request = self.http.request(method, url);
        let request = if let Some(json) = body {
            request.json(&json)
        } else {
            request
        };

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(server_error(status, &text));
        }

        Ok(serde_json::from_str(&text)?)
    }

    async fn api(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> Result<Value, CliError> {
        let url = format!("{}{}", self.base_url, path);
        self.request_json(method, &url, body).await
    }

    pub async fn ping(&self) -> Result<(), CliError> {
        let url = format!("{}/healthz", self.base_url);
        let status = self.http.get(url).send().await?.status();
        if !status.is_success() {
            return Err(CliError::ServerError { status: status.as_u16(), message: "health check failed".to_owned() });
        }
        Ok(())
    }

    pub async fn create_conversation(&self, user_id: Uuid, title: Option<&str>) -> Result<Conversation, CliError> {
        let body = serde_json::json!({ "userId": user_id, "title": title });
        let json = self
            .api(reqwest::Method::POST, "/api/conversations", Some(body))
            .await?;
        Ok(serde_json::from_value(json)?)
    }

    pub async fn list_conversations(&self, user_id: Uuid) -> Result<Value, CliError> {
        let path = format!("/api/conversations?userId={user_id}");
        self.api(reqwest::Method::GET, &path, None).await
    }

    pub async fn load_conversation(&self, id: Uuid) -> Result<ConversationThread, CliError> {
        let path = format!("/api/conversations/{id}");
        let json = self.api(reqwest::Method::GET, &path, None).await?;
        Ok(serde_json::from_value(json)?)
    }

    /// Send one chat message and return the assistant reply.
    pub async fn chat(&self, conversation_id: Uuid, message: &str) -> Result<String, CliError> {
        let body = serde_json::json!({ "message": message, "conversationId": conversation_id });
        self.retry
            .run(|_| {
                let body = body.clone();
                async move {
                    let json = self
                        .request_json(reqwest::Method::POST, &self.chat_url, Some(body))
                        .await?;
                    json.get("response")
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned)
                        .ok_or(CliError::MissingField("response"))
                }
            })
            .await
    }

    pub async fn generate_image(&self, user_id: Uuid, prompt: &str) -> Result<Value, CliError> {
        let body = serde_json::json!({ "prompt": prompt, "userId": user_id });
        self.api(reqwest::Method::POST, "/generate-image", Some(body))
            .await
    }

    pub async fn list_images(&self, user_id: Uuid) -> Result<Value, CliError> {
        let path = format!("/api/images?userId={user_id}");
        self.api(reqwest::Method::GET, &path, None).await
    }

    /// Fetch image bytes. Redirects to remote images are followed.
    pub async fn download_image(&self, id: Uuid) -> Result<Vec<u8>, CliError> {
        let url = format!("{}/api/images/{id}/download", self.base_url);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(server_error(status, &text));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn validate_url(raw: &str) -> Result<String, CliError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(trimmed.to_owned());
    }
    Err(CliError::InvalidBaseUrl(raw.to_owned()))
}

/// Error bodies are `{ "error": ... }` JSON; anything else is reported as-is.
fn server_error(status: reqwest::StatusCode, body: &str) -> CliError {
    let message = match serde_json::from_str::<Value>(body) {
        Ok(value) => value
            .get("error")
            .and_then(Value::as_str)
            .map_or_else(|| value.to_string(), str::to_owned),
        Err(_) => body.trim().to_owned(),
    };
    CliError::ServerError { status: status.as_u16(), message }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
