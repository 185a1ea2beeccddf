//! History routes: conversations and the image gallery.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use uuid::Uuid;

use super::{error_response, failure_response, json_rejection_response};
use crate::services::history::{self, HistoryError, ImageDownload};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationBody {
    pub user_id: Option<String>,
    pub title: Option<String>,
}

pub(crate) fn history_error_to_status(err: &HistoryError) -> StatusCode {
    match err {
        HistoryError::MissingUserId | HistoryError::InvalidUserId(_) => StatusCode::BAD_REQUEST,
        HistoryError::ConversationNotFound(_) | HistoryError::ImageNotFound(_) => StatusCode::NOT_FOUND,
        HistoryError::MalformedDataUrl => StatusCode::UNPROCESSABLE_ENTITY,
        HistoryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn history_error_response(err: HistoryError) -> Response {
    failure_response(history_error_to_status(&err), "history request", err.to_string())
}

/// Stored image fields end up in response headers; reject anything that is
/// not a legal header value.
fn header_value(raw: &str) -> Result<HeaderValue, HistoryError> {
    HeaderValue::from_str(raw).map_err(|_| HistoryError::MalformedDataUrl)
}

fn download_response(download: ImageDownload) -> Result<Response, HistoryError> {
    match download {
        ImageDownload::Inline { file_name, mime, bytes } => {
            let content_type = header_value(&mime)?;
            let disposition = header_value(&format!("attachment; filename=\"{}\"", file_name.replace('"', "")))?;
            Ok(([(CONTENT_TYPE, content_type), (CONTENT_DISPOSITION, disposition)], bytes).into_response())
        }
        ImageDownload::Remote(url) => {
            let location = header_value(&url)?;
            Ok((StatusCode::TEMPORARY_REDIRECT, [(LOCATION, location)]).into_response())
        }
    }
}

fn path_uuid(raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|_| error_response(StatusCode::BAD_REQUEST, format!("invalid id: {raw}")))
}

/// `POST /api/conversations`: create a conversation.
pub async fn create_conversation(
    State(state): State<AppState>,
    body: Result<Json<CreateConversationBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection_response(rejection),
    };
    let user_id = match history::parse_user_id(body.user_id.as_deref()) {
        Ok(id) => id,
        Err(e) => return history_error_response(e),
    };

    match history::create_conversation(&state, user_id, body.title.as_deref()).await {
        Ok(row) => (StatusCode::CREATED, Json(row)).into_response(),
        Err(e) => history_error_response(e),
    }
}

/// `GET /api/conversations?userId=`: list a user's conversations.
pub async fn list_conversations(State(state): State<AppState>, Query(query): Query<UserQuery>) -> Response {
    let user_id = match history::parse_user_id(query.user_id.as_deref()) {
        Ok(id) => id,
        Err(e) => return history_error_response(e),
    };

    match history::list_conversations(&state, user_id).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => history_error_response(e),
    }
}

/// `GET /api/conversations/:id`: reopen a conversation with its messages.
pub async fn get_conversation(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match path_uuid(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match history::load_conversation(&state, id).await {
        Ok(thread) => Json(thread).into_response(),
        Err(e) => history_error_response(e),
    }
}

/// `GET /api/images?userId=`: list a user's generated images.
pub async fn list_images(State(state): State<AppState>, Query(query): Query<UserQuery>) -> Response {
    let user_id = match history::parse_user_id(query.user_id.as_deref()) {
        Ok(id) => id,
        Err(e) => return history_error_response(e),
    };

    match history::list_images(&state, user_id).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => history_error_response(e),
    }
}

/// `GET /api/images/:id/download`: image bytes as an attachment.
pub async fn download_image(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match path_uuid(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match history::download_image(&state, id)
        .await
        .and_then(download_response)
    {
        Ok(resp) => resp,
        Err(e) => history_error_response(e),
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
