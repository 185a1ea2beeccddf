//! In-memory [`Store`] for handler and service tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::store::{ConversationRow, ImageRow, MessageRow, NewImage, Role, Store, StoreError};

#[derive(Default)]
struct Tables {
    conversations: Vec<ConversationRow>,
    messages: Vec<MessageRow>,
    images: Vec<ImageRow>,
    last_ts: Option<OffsetDateTime>,
}

impl Tables {
    /// Strictly increasing clock so ordering assertions are deterministic.
    fn tick(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let ts = match self.last_ts {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_ts = Some(ts);
        ts
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_message_inserts: AtomicBool,
    fail_image_inserts: AtomicBool,
    fail_message_reads: AtomicBool,
}

fn injected() -> StoreError {
    StoreError::Database(sqlx::Error::Protocol("injected failure".into()))
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_message_inserts(&self, fail: bool) {
        self.fail_message_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_image_inserts(&self, fail: bool) {
        self.fail_image_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_message_reads(&self, fail: bool) {
        self.fail_message_reads.store(fail, Ordering::SeqCst);
    }

    pub fn message_count(&self) -> usize {
        self.tables.lock().unwrap().messages.len()
    }

    pub fn image_count(&self) -> usize {
        self.tables.lock().unwrap().images.len()
    }

    pub fn conversation_count(&self) -> usize {
        self.tables.lock().unwrap().conversations.len()
    }

    /// Insert an image row directly, bypassing the generation path.
    pub fn seed_image(&self, user_id: Uuid, image_url: &str, file_name: Option<&str>) -> ImageRow {
        let mut tables = self.tables.lock().unwrap();
        let row = ImageRow {
            id: Uuid::new_v4(),
            user_id,
            prompt: "seeded".into(),
            image_url: image_url.into(),
            file_name: file_name.map(str::to_owned),
            created_at: tables.tick(),
        };
        tables.images.push(row.clone());
        row
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn create_conversation(&self, user_id: Uuid, title: &str) -> Result<ConversationRow, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let ts = tables.tick();
        let row = ConversationRow { id: Uuid::new_v4(), user_id, title: title.into(), created_at: ts, updated_at: ts };
        tables.conversations.push(row.clone());
        Ok(row)
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<ConversationRow>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.conversations.iter().find(|c| c.id == id).cloned())
    }

    async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationRow>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<_> = tables
            .conversations
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn touch_conversation(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let ts = tables.tick();
        if let Some(conv) = tables.conversations.iter_mut().find(|c| c.id == id) {
            conv.updated_at = ts;
        }
        Ok(())
    }

    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<MessageRow>, StoreError> {
        if self.fail_message_reads.load(Ordering::SeqCst) {
            return Err(injected());
        }
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<_> = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn insert_message(
        &self,
        conversation_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<MessageRow, StoreError> {
        if self.fail_message_inserts.load(Ordering::SeqCst) {
            return Err(injected());
        }
        let mut tables = self.tables.lock().unwrap();
        if !tables.conversations.iter().any(|c| c.id == conversation_id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }
        let row = MessageRow { id: Uuid::new_v4(), conversation_id, role, content: content.into(), created_at: tables.tick() };
        tables.messages.push(row.clone());
        Ok(row)
    }

    async fn insert_image(&self, image: NewImage<'_>) -> Result<ImageRow, StoreError> {
        if self.fail_image_inserts.load(Ordering::SeqCst) {
            return Err(injected());
        }
        let mut tables = self.tables.lock().unwrap();
        let row = ImageRow {
            id: Uuid::new_v4(),
            user_id: image.user_id,
            prompt: image.prompt.into(),
            image_url: image.image_url.into(),
            file_name: Some(image.file_name.into()),
            created_at: tables.tick(),
        };
        tables.images.push(row.clone());
        Ok(row)
    }

    async fn get_image(&self, id: Uuid) -> Result<Option<ImageRow>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.images.iter().find(|i| i.id == id).cloned())
    }

    async fn list_images(&self, user_id: Uuid) -> Result<Vec<ImageRow>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<_> = tables.images.iter().filter(|i| i.user_id == user_id).cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}
