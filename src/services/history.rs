//! History service: conversations, reopen, image gallery, image download.

use base64::Engine as _;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::parse_required_uuid;
use crate::db::{ConversationRow, ImageRow, MessageRow, StoreError};
use crate::state::AppState;

pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";
const DEFAULT_DOWNLOAD_NAME: &str = "generated-image.png";

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("userId is required")]
    MissingUserId,
    #[error("invalid userId: {0}")]
    InvalidUserId(String),
    #[error("conversation not found: {0}")]
    ConversationNotFound(Uuid),
    #[error("image not found: {0}")]
    ImageNotFound(Uuid),
    #[error("malformed image data URL")]
    MalformedDataUrl,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A conversation with its full message thread.
#[derive(Debug, Serialize)]
pub struct ConversationThread {
    #[serde(flatten)]
    pub conversation: ConversationRow,
    pub messages: Vec<MessageRow>,
}

/// Validate a required `userId` field.
///
/// # Errors
///
/// Returns an error if the id is absent, blank, or not a UUID.
pub fn parse_user_id(raw: Option<&str>) -> Result<Uuid, HistoryError> {
    parse_required_uuid(raw)
        .ok_or(HistoryError::MissingUserId)?
        .map_err(HistoryError::InvalidUserId)
}

// =============================================================================
// CONVERSATIONS
// =============================================================================

/// Create a conversation. Blank titles fall back to the default title.
///
/// # Errors
///
/// Returns a store error if the insert fails.
pub async fn create_conversation(
    state: &AppState,
    user_id: Uuid,
    title: Option<&str>,
) -> Result<ConversationRow, HistoryError> {
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_CONVERSATION_TITLE);
    let row = state.store.create_conversation(user_id, title).await?;
    info!(%user_id, conversation_id = %row.id, "history: conversation created");
    Ok(row)
}

/// # Errors
///
/// Returns a store error if the query fails.
pub async fn list_conversations(state: &AppState, user_id: Uuid) -> Result<Vec<ConversationRow>, HistoryError> {
    Ok(state.store.list_conversations(user_id).await?)
}

/// Load a conversation and its messages, oldest first.
///
/// # Errors
///
/// Returns [`HistoryError::ConversationNotFound`] or a store error.
pub async fn load_conversation(state: &AppState, id: Uuid) -> Result<ConversationThread, HistoryError> {
    let conversation = state
        .store
        .get_conversation(id)
        .await?
        .ok_or(HistoryError::ConversationNotFound(id))?;
    let messages = state.store.list_messages(id).await?;
    Ok(ConversationThread { conversation, messages })
}

// =============================================================================
// IMAGES
// =============================================================================

/// # Errors
///
/// Returns a store error if the query fails.
pub async fn list_images(state: &AppState, user_id: Uuid) -> Result<Vec<ImageRow>, HistoryError> {
    Ok(state.store.list_images(user_id).await?)
}

/// Decoded `data:` URL.
#[derive(Debug, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Parse `data:<mime>[;base64],<payload>`. Only base64 payloads are accepted.
#[must_use]
pub fn parse_data_url(url: &str) -> Option<DataUrl> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    let mime = if mime.is_empty() { "application/octet-stream" } else { mime };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()?;
    Some(DataUrl { mime: mime.to_owned(), bytes })
}

/// What a download resolves to.
#[derive(Debug, PartialEq, Eq)]
pub enum ImageDownload {
    /// Inline image bytes from a data URL.
    Inline { file_name: String, mime: String, bytes: Vec<u8> },
    /// Image hosted elsewhere.
    Remote(String),
}

/// Resolve a stored image into downloadable content.
///
/// # Errors
///
/// Returns [`HistoryError::ImageNotFound`], [`HistoryError::MalformedDataUrl`],
/// or a store error.
pub async fn download_image(state: &AppState, id: Uuid) -> Result<ImageDownload, HistoryError> {
    let image = state
        .store
        .get_image(id)
        .await?
        .ok_or(HistoryError::ImageNotFound(id))?;

    if !image.image_url.starts_with("data:") {
        return Ok(ImageDownload::Remote(image.image_url));
    }

    let DataUrl { mime, bytes } = parse_data_url(&image.image_url).ok_or(HistoryError::MalformedDataUrl)?;
    let file_name = image
        .file_name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_owned());
    Ok(ImageDownload::Inline { file_name, mime, bytes })
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
