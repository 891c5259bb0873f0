//! Config store error types.

use thiserror::Error;

/// Errors raised by a [`ConfigStore`](super::ConfigStore) backend.
///
/// A rejected compare-and-swap is not an error; see
/// [`WriteOutcome::Conflict`](super::WriteOutcome::Conflict).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing document failed.
    #[error("Failed to access store at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The backing document could not be (de)serialized.
    #[error("Store document is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking filesystem task was cancelled or panicked.
    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
