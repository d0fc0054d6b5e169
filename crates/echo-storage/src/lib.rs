//! Echo Storage crate - the durable conversation log.
//!
//! Provides the JSON file backing the memory log, the pure append and
//! context-window helpers, and the mutex-guarded `MemoryStore` that owns
//! the log for the lifetime of the process.

pub mod file;
pub mod history;
pub mod store;

pub use file::MemoryFile;
pub use history::{append, recent_window, DEFAULT_RECENT_COUNT};
pub use store::MemoryStore;
