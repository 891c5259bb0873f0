//! Propagation error types.

use thiserror::Error;

/// Errors that fail a single propagation.
#[derive(Debug, Error)]
pub enum PropagateError {
    /// Git operation failed.
    #[error(transparent)]
    Git(#[from] crate::git::GitError),

    /// Code host operation failed.
    #[error(transparent)]
    Host(#[from] crate::host::HostError),

    /// Config store operation failed.
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    /// Copying files failed.
    #[error(transparent)]
    Copy(#[from] crate::copy::CopyError),

    /// Filing a defect issue failed.
    #[error(transparent)]
    Issue(#[from] crate::issues::IssueError),

    /// Rendering the pull request body failed.
    #[error(transparent)]
    Template(#[from] crate::templates::TemplateError),

    /// The source commit could not be read back from the checkout.
    #[error("Source commit {0} not found in checkout")]
    MissingCommit(String),
}
