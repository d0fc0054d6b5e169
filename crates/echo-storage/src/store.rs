//! Process-wide owner of the conversation log.
//!
//! Wraps the log in a Mutex so concurrent requests append one at a time.
//! Every mutation is persisted while the lock is held, which keeps the
//! file in the same order as memory.

use std::sync::{Mutex, MutexGuard};

use tracing::{error, info};

use echo_core::types::{Message, Sender};

use crate::file::MemoryFile;
use crate::history::{append, recent_window};

/// Thread-safe, persisted message log.
///
/// The in-memory copy is authoritative: a failed write is logged by
/// `MemoryFile` and the log keeps the new entry for the rest of the process.
pub struct MemoryStore {
    log: Mutex<Vec<Message>>,
    file: MemoryFile,
}

impl MemoryStore {
    /// Load the log from `file` and take ownership of it.
    pub fn open(file: MemoryFile) -> Self {
        let log = file.load();
        info!(path = %file.path().display(), messages = log.len(), "Loaded messages from memory");
        Self {
            log: Mutex::new(log),
            file,
        }
    }

    /// Append one message, persist the log, and return the updated log.
    pub fn record(&self, sender: Sender, text: &str) -> Vec<Message> {
        let mut log = self.lock();
        *log = append(&log, sender, text);
        self.file.save(&log);
        log.clone()
    }

    /// Empty the log on disk and in memory.
    ///
    /// The in-memory log is emptied even when the file cannot be written.
    pub fn clear(&self) -> bool {
        let mut log = self.lock();
        let persisted = self.file.clear();
        log.clear();
        persisted
    }

    /// Copy of the full log, oldest first.
    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().clone()
    }

    /// Copy of the trailing `count` messages.
    pub fn recent(&self, count: usize) -> Vec<Message> {
        recent_window(&self.lock(), count).to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn file(&self) -> &MemoryFile {
        &self.file
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Message>> {
        self.log.lock().unwrap_or_else(|poisoned| {
            error!("Memory log lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
