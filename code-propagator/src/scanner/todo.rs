//! Units of pending work.

use crate::host::RepoName;
use std::fmt;

/// One source commit still to be propagated into one destination repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    /// Destination repository.
    pub repo: RepoName,

    /// Source commit to propagate.
    pub source_commit_hash: String,
}

impl Todo {
    /// Creates a work item.
    pub fn new(repo: RepoName, source_commit_hash: impl Into<String>) -> Self {
        Self {
            repo,
            source_commit_hash: source_commit_hash.into(),
        }
    }
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repo, self.source_commit_hash)
    }
}
