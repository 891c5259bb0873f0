//! Lock update error types.

use thiserror::Error;

/// Errors that can occur while updating one repository's lock file.
#[derive(Debug, Error)]
pub enum LockUpdateError {
    /// Git operation failed.
    #[error(transparent)]
    Git(#[from] crate::git::GitError),

    /// Code host operation failed.
    #[error(transparent)]
    Host(#[from] crate::host::HostError),

    /// Config store operation failed.
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),

    /// Writing the lock file failed.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Rendering the pull request body failed.
    #[error(transparent)]
    Template(#[from] crate::templates::TemplateError),
}
