//! Scanner error types.

use thiserror::Error;

/// Errors that abort a scan.
///
/// Per-repository failures never abort a scan; only problems with the
/// source repository or the store do.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Git operation on the source repository failed.
    #[error(transparent)]
    Git(#[from] crate::git::GitError),

    /// Config store operation failed.
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}
