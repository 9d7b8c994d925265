//! Best-effort snapshot of the ticket for the interactive flag-creation step.
//!
//! The snapshot lives at a fixed name in the platform temp directory and is
//! overwritten on every run. Concurrent runs race; the last writer wins.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name of the snapshot inside the temp directory.
pub const SESSION_FILE_NAME: &str = "claude_code_ticket_session.json";

/// Errors that can occur while writing the snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> crate::error::ErrorCode {
        crate::error::ErrorCode::SessionWriteFailed
    }
}

/// Writes the raw ticket to the snapshot path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecorder {
    path: PathBuf,
}

impl Default for SessionRecorder {
    fn default() -> Self {
        Self::at(std::env::temp_dir().join(SESSION_FILE_NAME))
    }
}

impl SessionRecorder {
    /// Recorder writing to an explicit path.
    #[must_use]
    pub const fn at(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `ticket` as indented JSON, replacing any previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Write`] if the file cannot be written. Callers
    /// report it as a warning; nothing is retried.
    pub fn record(&self, ticket: &Value) -> Result<&Path, SessionError> {
        let body = format!("{ticket:#}");
        match std::fs::write(&self.path, body) {
            Ok(()) => {
                info!(path = %self.path.display(), "stored ticket session");
                Ok(self.path.as_path())
            }
            Err(source) => {
                warn!(path = %self.path.display(), error = %source, "could not store ticket session");
                Err(SessionError::Write {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }
}
