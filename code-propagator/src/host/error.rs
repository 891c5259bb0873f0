//! Code host error types.

use thiserror::Error;

/// Errors that can occur while talking to the code host.
#[derive(Debug, Error)]
pub enum HostError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// A repository identifier was not of the form `owner/name`.
    #[error("Invalid repository name '{0}', expected 'owner/name'")]
    InvalidRepoName(String),

    /// Permission denied.
    #[error("Permission denied: no write access to {repo}")]
    PermissionDenied { repo: String },

    /// An open pull request already uses the head branch.
    #[error("A pull request from '{head}' already exists in {repo}")]
    PullRequestExists { repo: String, head: String },

    /// A host URL could not be built.
    #[error("Invalid host URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl HostError {
    /// Checks if the error indicates missing write access.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::GitHubError(e) => {
                let msg = e.to_string().to_lowercase();
                msg.contains("403") || msg.contains("forbidden") || msg.contains("permission")
            }
            Self::PermissionDenied { .. } => true,
            Self::InvalidRepoName(_) | Self::PullRequestExists { .. } | Self::InvalidUrl(_) => {
                false
            }
        }
    }
}
