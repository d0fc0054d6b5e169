//! Application state shared across all route handlers.
//!
//! Passed to handlers via axum's State extractor.

use std::sync::Arc;

use echo_chat::ChatRelay;

/// Shared application state.
///
/// Cloning is cheap; every handler task sees the same relay and log.
#[derive(Clone)]
pub struct AppState {
    /// The relay owning the memory log and the inference backend.
    pub relay: Arc<ChatRelay>,
}

impl AppState {
    pub fn new(relay: ChatRelay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}
