//! Echo API crate - axum HTTP surface of the chat relay.
//!
//! Exposes chat turns, the persisted history, memory clearing, and a
//! liveness probe as JSON endpoints under `/api`.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
