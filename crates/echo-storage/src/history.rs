//! Pure operations over an in-memory message log.

use echo_core::types::{Message, Sender};

/// Window size used when a caller does not pick one.
pub const DEFAULT_RECENT_COUNT: usize = 10;

/// Return a new log with one message appended, stamped with the current time.
///
/// The input slice is left untouched.
pub fn append(log: &[Message], sender: Sender, text: &str) -> Vec<Message> {
    let mut next = Vec::with_capacity(log.len() + 1);
    next.extend_from_slice(log);
    next.push(Message::now(sender, text));
    next
}

/// The trailing `count` messages of `log`, oldest first.
///
/// Returns the whole log when it is shorter than `count`.
pub fn recent_window(log: &[Message], count: usize) -> &[Message] {
    &log[log.len().saturating_sub(count)..]
}
