//! Chat session state and the send flow.
//!
//! The session is the local view of one conversation. A send appends the
//! user turn before the server answers and appends the assistant turn once
//! it does; the server stores both turns on its own.

use std::future::Future;

use uuid::Uuid;

use crate::api::{CliError, Conversation, ConversationThread, HubClient};

pub const NEW_CONVERSATION_TITLE: &str = "New Conversation";

/// The calls a session needs from the server.
pub trait ChatBackend {
    fn create_conversation(&self, user_id: Uuid, title: &str) -> impl Future<Output = Result<Conversation, CliError>>;

    fn send_chat(&self, conversation_id: Uuid, message: &str) -> impl Future<Output = Result<String, CliError>>;
}

impl ChatBackend for HubClient {
    async fn create_conversation(&self, user_id: Uuid, title: &str) -> Result<Conversation, CliError> {
        HubClient::create_conversation(self, user_id, Some(title)).await
    }

    async fn send_chat(&self, conversation_id: Uuid, message: &str) -> Result<String, CliError> {
        self.chat(conversation_id, message).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenConversation {
    pub id: Uuid,
    pub title: String,
    pub turns: Vec<Turn>,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    conversation: Option<OpenConversation>,
    loading: bool,
}

impl ChatSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session with a conversation loaded from the server.
    #[must_use]
    pub fn reopen(thread: ConversationThread) -> Self {
        let turns = thread
            .messages
            .into_iter()
            .map(|m| Turn {
                speaker: if m.role == "assistant" { Speaker::Assistant } else { Speaker::User },
                content: m.content,
            })
            .collect();
        Self { conversation: Some(OpenConversation { id: thread.id, title: thread.title, turns }), loading: false }
    }

    #[must_use]
    pub fn conversation(&self) -> Option<&OpenConversation> {
        self.conversation.as_ref()
    }

    #[cfg(test)]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn push(&mut self, speaker: Speaker, content: &str) {
        if let Some(conv) = self.conversation.as_mut() {
            conv.turns.push(Turn { speaker, content: content.to_owned() });
        }
    }

    /// Send `input` through `backend`, creating a conversation first if the
    /// session has none. Returns `Ok(None)` when the input is blank.
    ///
    /// # Errors
    ///
    /// [`CliError::Busy`] while another send is in flight, otherwise
    /// whatever the backend reports. The user turn stays visible on failure.
    pub async fn send<B: ChatBackend>(
        &mut self,
        backend: &B,
        user_id: Uuid,
        input: &str,
    ) -> Result<Option<String>, CliError> {
        let text = input.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self.loading {
            return Err(CliError::Busy);
        }

        self.loading = true;
        let result = self.send_inner(backend, user_id, text).await;
        self.loading = false;
        result.map(Some)
    }

    async fn send_inner<B: ChatBackend>(&mut self, backend: &B, user_id: Uuid, text: &str) -> Result<String, CliError> {
        let conversation_id = match &self.conversation {
            Some(conv) => conv.id,
            None => {
                let created = backend
                    .create_conversation(user_id, NEW_CONVERSATION_TITLE)
                    .await?;
                let id = created.id;
                self.conversation = Some(OpenConversation { id, title: created.title, turns: Vec::new() });
                id
            }
        };

        self.push(Speaker::User, text);
        let reply = backend.send_chat(conversation_id, text).await?;
        self.push(Speaker::Assistant, &reply);
        Ok(reply)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
