//! Git error types.

use thiserror::Error;

/// Errors that can occur while running git.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git process could not be started.
    #[error("Failed to execute git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Git exited unsuccessfully.
    #[error("git {command} failed: {stderr}")]
    Failed { command: String, stderr: String },

    /// A scratch directory for a checkout could not be created.
    #[error("Failed to create checkout directory: {0}")]
    TempDir(#[source] std::io::Error),

    /// Git produced output that could not be interpreted.
    #[error("Unexpected output from git {command}: {message}")]
    UnexpectedOutput { command: String, message: String },
}
