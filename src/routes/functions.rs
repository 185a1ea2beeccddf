//! AI function endpoints: `chat-with-ai` and `generate-image`.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{failure_response, json_rejection_response};
use crate::services::chat::{self, ChatError};
use crate::services::image::{self, ImageError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    pub message: Option<String>,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub response: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequestBody {
    pub prompt: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponseBody {
    pub image: String,
    pub id: Uuid,
    pub prompt: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub(crate) fn chat_error_to_status(err: &ChatError) -> StatusCode {
    match err {
        ChatError::MissingInput | ChatError::InvalidConversationId(_) => StatusCode::BAD_REQUEST,
        ChatError::ConversationNotFound(_) => StatusCode::NOT_FOUND,
        ChatError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn image_error_to_status(err: &ImageError) -> StatusCode {
    match err {
        ImageError::MissingInput | ImageError::InvalidUserId(_) => StatusCode::BAD_REQUEST,
        ImageError::LlmNotConfigured | ImageError::Llm(_) | ImageError::NoImage | ImageError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `POST /chat-with-ai`: one chat exchange.
pub async fn chat_with_ai(
    State(state): State<AppState>,
    body: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection_response(rejection),
    };

    let result = match chat::parse_input(body.message.as_deref(), body.conversation_id.as_deref()) {
        Ok(input) => chat::send_message(&state, input).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => Json(ChatResponseBody { response }).into_response(),
        Err(e) => failure_response(chat_error_to_status(&e), "chat-with-ai", e.to_string()),
    }
}

/// `POST /generate-image`: generate and store one image.
pub async fn generate_image(
    State(state): State<AppState>,
    body: Result<Json<ImageRequestBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection_response(rejection),
    };

    let result = match image::parse_input(body.prompt.as_deref(), body.user_id.as_deref()) {
        Ok(input) => image::generate(&state, input).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(row) => Json(ImageResponseBody {
            image: row.image_url,
            id: row.id,
            prompt: row.prompt,
            created_at: row.created_at,
        })
        .into_response(),
        Err(e) => failure_response(image_error_to_status(&e), "generate-image", e.to_string()),
    }
}

#[cfg(test)]
#[path = "functions_test.rs"]
mod tests;
