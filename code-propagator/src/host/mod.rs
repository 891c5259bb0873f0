//! Remote code host.
//!
//! The engine only needs a handful of operations from the code host: existence
//! searches for propagation markers, listings of recent issues and pull
//! requests, and creation of issues and pull requests. [`CodeHost`] is that
//! seam; [`GitHubHost`] implements it on top of octocrab.

mod error;
mod github;
pub mod rate_limit;
mod remote;
mod types;

pub use error::HostError;
pub use github::GitHubHost;
pub use remote::RemoteHost;
pub use types::{Artifact, CreatedArtifact, NewPullRequest, RepoName};

use async_trait::async_trait;

/// Operations the engine performs against the code host.
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Unarchived repositories the credentials were granted, sorted.
    async fn list_repositories(&self) -> Result<Vec<RepoName>, HostError>;

    /// Number of commits in `repo` whose search index matches `text`.
    async fn search_commits(&self, repo: &RepoName, text: &str) -> Result<u64, HostError>;

    /// Number of issues and pull requests in `repo` whose search index matches `text`.
    async fn search_issues_and_pull_requests(
        &self,
        repo: &RepoName,
        text: &str,
    ) -> Result<u64, HostError>;

    /// The `limit` most recently created pull requests of `repo`, in any state.
    async fn recent_pull_requests(
        &self,
        repo: &RepoName,
        limit: u8,
    ) -> Result<Vec<Artifact>, HostError>;

    /// The `limit` most recently created issues of `repo`, in any state.
    async fn recent_issues(&self, repo: &RepoName, limit: u8) -> Result<Vec<Artifact>, HostError>;

    /// Number of an open issue titled exactly `title`, if one exists.
    async fn find_open_issue(&self, repo: &RepoName, title: &str)
        -> Result<Option<u64>, HostError>;

    /// Opens an issue.
    async fn create_issue(
        &self,
        repo: &RepoName,
        title: &str,
        body: &str,
    ) -> Result<CreatedArtifact, HostError>;

    /// Opens a pull request.
    async fn create_pull_request(
        &self,
        repo: &RepoName,
        request: &NewPullRequest,
    ) -> Result<CreatedArtifact, HostError>;

    /// The open pull request whose head is `head`, if any.
    async fn find_open_pull_request(
        &self,
        repo: &RepoName,
        head: &str,
    ) -> Result<Option<CreatedArtifact>, HostError>;

    /// Closes a pull request without merging it.
    async fn close_pull_request(&self, repo: &RepoName, number: u64) -> Result<(), HostError>;
}

/// Builds a repository-scoped search query.
///
/// Format: `repo:{owner}/{name} {text}`
#[must_use]
pub fn build_search_query(repo: &RepoName, text: &str) -> String {
    format!("repo:{} {}", repo.full_name(), text)
}
