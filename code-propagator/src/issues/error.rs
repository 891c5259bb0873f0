//! Issue creation error types.

use thiserror::Error;

/// Errors that can occur during issue operations.
#[derive(Debug, Error)]
pub enum IssueError {
    /// Code host error.
    #[error(transparent)]
    Host(#[from] crate::host::HostError),

    /// Template rendering error.
    #[error("Template rendering error: {0}")]
    TemplateError(#[from] crate::templates::TemplateError),
}
