//! Processing result types.

use serde::Serialize;

/// Result of processing a single unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ProcessingResult {
    /// A pull request was opened.
    Propagated {
        /// Repository full name.
        repository: String,
        /// Pull request number.
        number: u64,
        /// Pull request URL.
        url: String,
    },

    /// A repository's declarative files were recorded.
    Refreshed {
        /// Repository full name.
        repository: String,
        /// Destination commit the files were read at.
        commit_hash: String,
    },

    /// Nothing needed doing, or the repository could not be acted on.
    Skipped {
        /// Repository full name.
        repository: String,
        /// Reason for skipping.
        reason: String,
    },

    /// Another run got there first; the work was abandoned.
    Collision {
        /// Repository full name.
        repository: String,
        /// What was found.
        reason: String,
    },

    /// Processing failed.
    Failed {
        /// Repository full name.
        repository: String,
        /// Error message.
        error: String,
    },
}

impl ProcessingResult {
    /// Repository the result is about.
    #[must_use]
    pub fn repository(&self) -> &str {
        match self {
            Self::Propagated { repository, .. }
            | Self::Refreshed { repository, .. }
            | Self::Skipped { repository, .. }
            | Self::Collision { repository, .. }
            | Self::Failed { repository, .. } => repository,
        }
    }
}
