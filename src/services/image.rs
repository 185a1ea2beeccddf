//! Image service: prompt in, stored image reference out.
//!
//! Unlike chat, every failure here is a request failure: a response without
//! an image is an error and nothing is written to `generated_images`.

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::{parse_required_uuid, required_text};
use crate::db::{ImageRow, NewImage, StoreError};
use crate::llm::types::LlmError;
use crate::state::AppState;

const PROMPT_LOG_PREVIEW_CHARS: usize = 80;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Prompt and userId are required")]
    MissingInput,
    #[error("invalid userId: {0}")]
    InvalidUserId(String),
    #[error("AI gateway not configured")]
    LlmNotConfigured,
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("No image returned from AI gateway")]
    NoImage,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validated image request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInput<'a> {
    pub user_id: Uuid,
    pub prompt: &'a str,
}

/// Validate raw request fields.
///
/// # Errors
///
/// [`ImageError::MissingInput`] if either field is absent or blank,
/// [`ImageError::InvalidUserId`] if the id is not a UUID.
pub fn parse_input<'a>(prompt: Option<&'a str>, user_id: Option<&str>) -> Result<ImageInput<'a>, ImageError> {
    let prompt = required_text(prompt).ok_or(ImageError::MissingInput)?;
    let user_id = parse_required_uuid(user_id)
        .ok_or(ImageError::MissingInput)?
        .map_err(ImageError::InvalidUserId)?;
    Ok(ImageInput { user_id, prompt })
}

/// File name stored alongside a generated image.
#[must_use]
pub fn generated_file_name(at: OffsetDateTime) -> String {
    let millis = at.unix_timestamp_nanos() / 1_000_000;
    format!("generated-{millis}.png")
}

fn preview(prompt: &str) -> String {
    prompt.chars().take(PROMPT_LOG_PREVIEW_CHARS).collect()
}

/// Generate an image for `input.prompt` and store it for `input.user_id`.
///
/// # Errors
///
/// Returns an error if the gateway is unconfigured, the call fails, no image
/// comes back, or the insert fails.
pub async fn generate(state: &AppState, input: ImageInput<'_>) -> Result<ImageRow, ImageError> {
    let ImageInput { user_id, prompt } = input;
    info!(%user_id, prompt = %preview(prompt), "image: generation requested");

    let llm = state.llm.as_ref().ok_or(ImageError::LlmNotConfigured)?;

    let resp = llm.generate_image(prompt).await.map_err(|e| {
        warn!(%user_id, error = %e, "image: gateway call failed");
        ImageError::Llm(e)
    })?;

    let Some(image_url) = resp.images.into_iter().next() else {
        warn!(%user_id, model = %resp.model, "image: gateway returned no image");
        return Err(ImageError::NoImage);
    };

    let file_name = generated_file_name(OffsetDateTime::now_utc());
    let row = state
        .store
        .insert_image(NewImage { user_id, prompt, image_url: &image_url, file_name: &file_name })
        .await?;

    info!(%user_id, image_id = %row.id, %file_name, "image: saved");
    Ok(row)
}

#[cfg(test)]
#[path = "image_test.rs"]
mod tests;
