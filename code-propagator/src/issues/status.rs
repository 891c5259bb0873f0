//! Issue status types.

use serde::Serialize;

/// Status of an issue filing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IssueStatus {
    /// Issue successfully created.
    Created {
        /// Issue number.
        number: u64,
        /// Issue URL.
        url: String,
    },

    /// An open issue with the same title already exists.
    Existing {
        /// Issue number.
        number: u64,
    },

    /// Issue creation skipped.
    Skipped {
        /// Reason for skipping.
        reason: String,
    },
}
