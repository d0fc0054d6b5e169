//! System prompt and request assembly.

use echo_core::config::ChatConfig;
use echo_core::types::Message;
use echo_storage::recent_window;

use crate::types::{ChatRequest, PromptMessage, Role};

/// Persona sent as the first message of every request.
pub const SYSTEM_PROMPT: &str = "You are Echo, my friend. Talk to me like a real friend would - keep it short, casual, and natural. No formalities, no long explanations, no emojis. Just be chill and conversational, like we're texting.";

/// System prompt for a log of `log_len` messages.
///
/// Long conversations get a reminder of how much history exists.
pub fn system_prompt(log_len: usize, hint_threshold: usize) -> String {
    if log_len > hint_threshold {
        format!(
            "{}\n\nYou have {} messages in our conversation history. Remember past topics and context when responding.",
            SYSTEM_PROMPT, log_len
        )
    } else {
        SYSTEM_PROMPT.to_string()
    }
}

/// Build the outbound request from the full log.
///
/// Only the trailing `config.context_window` messages are forwarded.
pub fn build_request(model: &str, log: &[Message], config: &ChatConfig) -> ChatRequest {
    let mut messages = Vec::with_capacity(config.context_window.min(log.len()) + 1);
    messages.push(PromptMessage::new(
        Role::System,
        system_prompt(log.len(), config.history_hint_threshold),
    ));
    messages.extend(
        recent_window(log, config.context_window)
            .iter()
            .map(|m| PromptMessage::new(m.sender.into(), m.text.clone())),
    );

    ChatRequest {
        model: model.to_string(),
        messages,
        stream: false,
    }
}
