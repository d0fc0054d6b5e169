//! JSON file backing the memory log.
//!
//! The file always holds one pretty-printed array. Read and write failures
//! are logged and swallowed here so the chat keeps working for the session
//! even when the disk does not.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use echo_core::error::{EchoError, Result};
use echo_core::types::Message;

/// Handle to the on-disk memory log.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    path: PathBuf,
}

impl MemoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the log from disk.
    ///
    /// A missing file is an empty log. Unreadable files, invalid JSON, and
    /// JSON that is not an array of messages also yield an empty log.
    pub fn load(&self) -> Vec<Message> {
        match self.read() {
            Ok(messages) => messages,
            Err(EchoError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No memory file yet, starting empty");
                Vec::new()
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Error loading memory");
                Vec::new()
            }
        }
    }

    /// Overwrite the file with `messages`. Returns `false` if the write failed.
    pub fn save(&self, messages: &[Message]) -> bool {
        match self.write(messages) {
            Ok(()) => true,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Error saving memory");
                false
            }
        }
    }

    /// Overwrite the file with an empty array. Returns `false` if the write failed.
    pub fn clear(&self) -> bool {
        match self.write(&[]) {
            Ok(()) => true,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Error clearing memory");
                false
            }
        }
    }

    fn read(&self) -> Result<Vec<Message>> {
        let content = std::fs::read_to_string(&self.path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        if !value.is_array() {
            warn!(path = %self.path.display(), "Memory file does not hold an array, ignoring it");
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value)?)
    }

    fn write(&self, messages: &[Message]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(messages)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
