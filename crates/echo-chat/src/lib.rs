//! Conversational relay for Echo.
//!
//! Server side: prompt assembly, the inference backend seam with its Ollama
//! implementation, and the `ChatRelay` that runs one turn against the
//! memory log. Client side: the HTTP transport to the relay and the
//! typing-playback view that reveals replies one character at a time.

pub mod backend;
pub mod client;
pub mod error;
pub mod ollama;
pub mod playback;
pub mod prompt;
pub mod relay;
pub mod types;

pub use backend::InferenceBackend;
pub use client::{ChatTransport, DemoFallback, RelayClient};
pub use error::ChatError;
pub use ollama::OllamaBackend;
pub use playback::{
    ChatView, PlaybackPhase, PlaybackTiming, RenderedMessage, SendOutcome, ViewSnapshot,
};
pub use relay::ChatRelay;
pub use types::{ChatReply, ChatRequest, PromptMessage, Role};
