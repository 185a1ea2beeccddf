//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the two AI function endpoints and the history API
//! under a single Axum router. Every route is open to all origins; the CORS
//! layer answers `OPTIONS` preflights with an empty 200.

pub mod functions;
pub mod history;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;

use crate::state::AppState;

/// JSON error body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Render `{ "error": message }` with the given status.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody { error: message.into() })).into_response()
}

/// Server faults log at `error`, client mistakes at `warn`.
pub(crate) fn failure_level(status: StatusCode) -> Level {
    if status.is_server_error() { Level::ERROR } else { Level::WARN }
}

/// Log a failed request at [`failure_level`] and render the error body.
pub(crate) fn failure_response(status: StatusCode, context: &str, message: String) -> Response {
    if failure_level(status) == Level::ERROR {
        tracing::error!(%status, error = %message, "{context} failed");
    } else {
        tracing::warn!(%status, error = %message, "{context} rejected");
    }
    error_response(status, message)
}

/// Map a body extraction failure to the JSON error shape.
pub(crate) fn json_rejection_response(rejection: JsonRejection) -> Response {
    error_response(StatusCode::BAD_REQUEST, rejection.body_text())
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat-with-ai", post(functions::chat_with_ai))
        .route("/functions/v1/chat-with-ai", post(functions::chat_with_ai))
        .route("/generate-image", post(functions::generate_image))
        .route("/functions/v1/generate-image", post(functions::generate_image))
        .route(
            "/api/conversations",
            get(history::list_conversations).post(history::create_conversation),
        )
        .route("/api/conversations/{id}", get(history::get_conversation))
        .route("/api/images", get(history::list_images))
        .route("/api/images/{id}/download", get(history::download_image))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
