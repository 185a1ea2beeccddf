//! `PostgreSQL` implementation of [`Store`].

use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::store::{ConversationRow, ImageRow, MessageRow, NewImage, Role, Store, StoreError};

type ConversationTuple = (Uuid, Uuid, String, OffsetDateTime, OffsetDateTime);
type MessageTuple = (Uuid, Uuid, String, String, OffsetDateTime);
type ImageTuple = (Uuid, Uuid, String, String, Option<String>, OffsetDateTime);

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn conversation_from_tuple((id, user_id, title, created_at, updated_at): ConversationTuple) -> ConversationRow {
    ConversationRow { id, user_id, title, created_at, updated_at }
}

fn message_from_tuple((id, conversation_id, role, content, created_at): MessageTuple) -> Result<MessageRow, StoreError> {
    let role = Role::parse(&role).ok_or(StoreError::InvalidRole(role))?;
    Ok(MessageRow { id, conversation_id, role, content, created_at })
}

fn image_from_tuple((id, user_id, prompt, image_url, file_name, created_at): ImageTuple) -> ImageRow {
    ImageRow { id, user_id, prompt, image_url, file_name, created_at }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn create_conversation(&self, user_id: Uuid, title: &str) -> Result<ConversationRow, StoreError> {
        let row = sqlx::query_as::<_, ConversationTuple>(
            "INSERT INTO conversations (id, user_id, title)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, title, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await?;

        Ok(conversation_from_tuple(row))
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<ConversationRow>, StoreError> {
        let row = sqlx::query_as::<_, ConversationTuple>(
            "SELECT id, user_id, title, created_at, updated_at FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(conversation_from_tuple))
    }

    async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationRow>, StoreError> {
        let rows = sqlx::query_as::<_, ConversationTuple>(
            "SELECT id, user_id, title, created_at, updated_at
             FROM conversations
             WHERE user_id = $1
             ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(conversation_from_tuple).collect())
    }

    async fn touch_conversation(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE conversations SET updated_at = clock_timestamp() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<MessageRow>, StoreError> {
        let rows = sqlx::query_as::<_, MessageTuple>(
            "SELECT id, conversation_id, role, content, created_at
             FROM messages
             WHERE conversation_id = $1
             ORDER BY created_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(message_from_tuple).collect()
    }

    async fn insert_message(
        &self,
        conversation_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<MessageRow, StoreError> {
        let row = sqlx::query_as::<_, MessageTuple>(
            "INSERT INTO messages (id, conversation_id, role, content)
             VALUES ($1, $2, $3, $4)
             RETURNING id, conversation_id, role, content, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(role.as_str())
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        message_from_tuple(row)
    }

    async fn insert_image(&self, image: NewImage<'_>) -> Result<ImageRow, StoreError> {
        let row = sqlx::query_as::<_, ImageTuple>(
            "INSERT INTO generated_images (id, user_id, prompt, image_url, file_name)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, user_id, prompt, image_url, file_name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(image.user_id)
        .bind(image.prompt)
        .bind(image.image_url)
        .bind(image.file_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(image_from_tuple(row))
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<ImageRow>, StoreError> {
        let row = sqlx::query_as::<_, ImageTuple>(
            "SELECT id, user_id, prompt, image_url, file_name, created_at FROM generated_images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(image_from_tuple))
    }

    async fn list_images(&self, user_id: Uuid) -> Result<Vec<ImageRow>, StoreError> {
        let rows = sqlx::query_as::<_, ImageTuple>(
            "SELECT id, user_id, prompt, image_url, file_name, created_at
             FROM generated_images
             WHERE user_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(image_from_tuple).collect())
    }
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
