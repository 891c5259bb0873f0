//! Copy error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while materializing copy rules.
#[derive(Debug, Error)]
pub enum CopyError {
    /// A filesystem operation failed.
    #[error("Failed to {action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Enumerating the source tree failed.
    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// A rule's destination leaves the destination root.
    #[error("Copy rule destination escapes the repository: {dest}")]
    InvalidDestination { dest: String },
}

impl CopyError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
