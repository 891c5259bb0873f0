//! Config refresh error types.

use thiserror::Error;

/// Errors that can occur while refreshing a repository's stored configuration.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Git operation failed.
    #[error(transparent)]
    Git(#[from] crate::git::GitError),

    /// Code host operation failed.
    #[error(transparent)]
    Host(#[from] crate::host::HostError),

    /// Config store operation failed.
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    /// Filing a defect issue failed.
    #[error(transparent)]
    Issue(#[from] crate::issues::IssueError),
}
