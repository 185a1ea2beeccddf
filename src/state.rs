//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the store and the optional gateway client. Requests share no
//! other mutable state.

use std::sync::Arc;

use crate::db::Store;
use crate::llm::LlmChat;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Optional gateway client. `None` if the API key is not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, llm: Option<Arc<dyn LlmChat>>) -> Self {
        Self { store, llm }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
