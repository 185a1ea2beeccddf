//! Store trait and row types for conversations, messages, and images.
//!
//! DESIGN
//! ======
//! Rows mirror the three tables one-to-one. The application only inserts and
//! selects; the one mutation is bumping `conversations.updated_at`. Foreign
//! key integrity and timestamp defaults belong to the database.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("unknown message role: {0}")]
    InvalidRole(String),
}

// =============================================================================
// ROLE
// =============================================================================

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

// =============================================================================
// ROWS
// =============================================================================

/// Row from `conversations`.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Row from `messages`.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: Role,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Row from `generated_images`.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt: String,
    pub image_url: String,
    pub file_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Insert payload for `generated_images`.
#[derive(Debug, Clone, Copy)]
pub struct NewImage<'a> {
    pub user_id: Uuid,
    pub prompt: &'a str,
    pub image_url: &'a str,
    pub file_name: &'a str,
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Data access used by the chat, image, and history services.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Insert a conversation owned by `user_id`.
    async fn create_conversation(&self, user_id: Uuid, title: &str) -> Result<ConversationRow, StoreError>;

    async fn get_conversation(&self, id: Uuid) -> Result<Option<ConversationRow>, StoreError>;

    /// Conversations for a user, most recently updated first.
    async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationRow>, StoreError>;

    /// Bump `updated_at` to now.
    async fn touch_conversation(&self, id: Uuid) -> Result<(), StoreError>;

    /// Messages of a conversation, oldest first.
    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<MessageRow>, StoreError>;

    async fn insert_message(&self, conversation_id: Uuid, role: Role, content: &str)
    -> Result<MessageRow, StoreError>;

    async fn insert_image(&self, image: NewImage<'_>) -> Result<ImageRow, StoreError>;

    async fn get_image(&self, id: Uuid) -> Result<Option<ImageRow>, StoreError>;

    /// Generated images for a user, newest first.
    async fn list_images(&self, user_id: Uuid) -> Result<Vec<ImageRow>, StoreError>;
}
