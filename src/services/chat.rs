//! Chat service: one user turn in, one assistant turn out.
//!
//! DESIGN
//! ======
//! History is loaded before the new user message is stored, then history +
//! new message go to the gateway as one transcript under a fixed system
//! prompt. Exactly one gateway call per request, no retry.
//!
//! ERROR HANDLING
//! ==============
//! Only bad input, an unknown conversation, and a failed history load fail
//! the request. Gateway failures become placeholder replies (429 and 402 get
//! their own wording), and the placeholder is stored like any other reply.
//! Message inserts and the `updated_at` bump are best-effort: logged, then
//! ignored.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::{parse_required_uuid, required_text};
use crate::db::{Role, StoreError};
use crate::llm::LlmChat;
use crate::llm::types::{LlmError, Message};
use crate::state::AppState;

pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant in the AI Creative Hub. Be creative, helpful, and engaging. Support both English and Arabic languages.";

pub const RATE_LIMITED_REPLY: &str = "Rate limit reached. Please wait a moment and try again.";
pub const PAYMENT_REQUIRED_REPLY: &str =
    "Payment required for AI usage. Please add credits to your AI gateway workspace.";
pub const UNAVAILABLE_REPLY: &str =
    "I apologize, but I cannot generate a response right now. Please make sure your API keys are configured properly.";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message and conversationId are required")]
    MissingInput,
    #[error("invalid conversationId: {0}")]
    InvalidConversationId(String),
    #[error("conversation not found: {0}")]
    ConversationNotFound(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validated chat request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatInput<'a> {
    pub conversation_id: Uuid,
    pub message: &'a str,
}

/// Validate raw request fields.
///
/// # Errors
///
/// [`ChatError::MissingInput`] if either field is absent or blank,
/// [`ChatError::InvalidConversationId`] if the id is not a UUID.
pub fn parse_input<'a>(message: Option<&'a str>, conversation_id: Option<&str>) -> Result<ChatInput<'a>, ChatError> {
    let message = required_text(message).ok_or(ChatError::MissingInput)?;
    let conversation_id = parse_required_uuid(conversation_id)
        .ok_or(ChatError::MissingInput)?
        .map_err(ChatError::InvalidConversationId)?;
    Ok(ChatInput { conversation_id, message })
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Run one chat exchange and return the assistant text.
///
/// # Errors
///
/// Returns an error if the conversation is unknown or its history cannot be
/// loaded. Gateway failures never surface here.
pub async fn send_message(state: &AppState, input: ChatInput<'_>) -> Result<String, ChatError> {
    let ChatInput { conversation_id, message } = input;
    info!(%conversation_id, message_len = message.len(), "chat: message received");

    if state.store.get_conversation(conversation_id).await?.is_none() {
        return Err(ChatError::ConversationNotFound(conversation_id));
    }

    let history = state.store.list_messages(conversation_id).await?;

    if let Err(e) = state
        .store
        .insert_message(conversation_id, Role::User, message)
        .await
    {
        warn!(%conversation_id, error = %e, "chat: failed to save user message");
    }

    let mut transcript: Vec<Message> = history
        .into_iter()
        .map(|m| Message { role: m.role.as_str().to_owned(), content: m.content })
        .collect();
    transcript.push(Message::user(message));

    let reply = complete(state.llm.as_ref(), &transcript).await;

    if let Err(e) = state
        .store
        .insert_message(conversation_id, Role::Assistant, &reply)
        .await
    {
        warn!(%conversation_id, error = %e, "chat: failed to save assistant message");
    }

    if let Err(e) = state.store.touch_conversation(conversation_id).await {
        warn!(%conversation_id, error = %e, "chat: failed to bump conversation timestamp");
    }

    info!(%conversation_id, reply_len = reply.len(), "chat: request completed");
    Ok(reply)
}

/// Ask the gateway for a reply; any failure maps to a placeholder.
async fn complete(llm: Option<&Arc<dyn LlmChat>>, transcript: &[Message]) -> String {
    let Some(llm) = llm else {
        warn!("chat: AI gateway not configured");
        return UNAVAILABLE_REPLY.to_owned();
    };

    match llm.chat(SYSTEM_PROMPT, transcript).await {
        Ok(resp) => {
            if let Some(text) = resp.text {
                info!(model = %resp.model, output_tokens = resp.output_tokens, "chat: gateway reply received");
                text
            } else {
                warn!(model = %resp.model, "chat: gateway returned no text");
                UNAVAILABLE_REPLY.to_owned()
            }
        }
        Err(e) => {
            match &e {
                LlmError::ApiResponse { status, body } => {
                    warn!(status, body = %body, "chat: gateway returned error status");
                }
                other => warn!(error = %other, "chat: gateway call failed"),
            }
            fallback_reply(&e).to_owned()
        }
    }
}

/// Placeholder text for a failed gateway call.
#[must_use]
pub fn fallback_reply(err: &LlmError) -> &'static str {
    match err.status() {
        Some(429) => RATE_LIMITED_REPLY,
        Some(402) => PAYMENT_REQUIRED_REPLY,
        _ => UNAVAILABLE_REPLY,
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
