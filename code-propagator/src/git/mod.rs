//! Version-control collaborator.
//!
//! The engine never transports git objects itself. It asks a [`GitExecutor`]
//! to clone, inspect history, commit and push; [`CommandGit`] does so by
//! running the `git` binary.

mod command;
mod error;

pub use command::CommandGit;
pub use error::GitError;

use async_trait::async_trait;
use std::path::Path;
use tempfile::TempDir;

/// A commit read from history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full commit hash.
    pub hash: String,

    /// Full commit message.
    pub message: String,
}

impl CommitInfo {
    /// First line of the commit message.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// Git operations the engine relies on.
#[async_trait]
pub trait GitExecutor: Send + Sync {
    /// Clones `url` into the existing, empty directory `dest`.
    ///
    /// `depth` limits history; `branch` selects the branch to check out.
    async fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        depth: Option<usize>,
        branch: Option<&str>,
    ) -> Result<(), GitError>;

    /// Up to `max_count` commits reachable from `rev`, newest first.
    async fn log(
        &self,
        repo: &Path,
        rev: &str,
        max_count: usize,
    ) -> Result<Vec<CommitInfo>, GitError>;

    /// Paths touched by `commit`, relative to the repository root.
    async fn changed_files(&self, repo: &Path, commit: &str) -> Result<Vec<String>, GitError>;

    /// Checks out `rev` with a detached `HEAD`.
    async fn checkout(&self, repo: &Path, rev: &str) -> Result<(), GitError>;

    /// Creates and checks out a new branch at `HEAD`.
    async fn create_branch(&self, repo: &Path, branch: &str) -> Result<(), GitError>;

    /// Hash of the commit at `HEAD`.
    async fn head(&self, repo: &Path) -> Result<String, GitError>;

    /// Name of the checked out branch.
    async fn current_branch(&self, repo: &Path) -> Result<String, GitError>;

    /// Returns whether the working tree has uncommitted changes.
    async fn has_changes(&self, repo: &Path) -> Result<bool, GitError>;

    /// Stages everything and commits it with `message`.
    async fn commit_all(&self, repo: &Path, message: &str) -> Result<(), GitError>;

    /// Pushes `HEAD` to `branch` on `remote_url`, replacing whatever is there.
    async fn push(&self, repo: &Path, remote_url: &str, branch: &str) -> Result<(), GitError>;
}

/// Clones `url` into a fresh temporary directory.
///
/// The checkout is deleted when the returned [`TempDir`] is dropped.
///
/// # Errors
///
/// Returns [`GitError`] if the directory cannot be created or the clone fails.
pub async fn clone_to_temp(
    git: &dyn GitExecutor,
    url: &str,
    depth: Option<usize>,
    branch: Option<&str>,
) -> Result<TempDir, GitError> {
    let dir = TempDir::new().map_err(GitError::TempDir)?;
    git.clone_repo(url, dir.path(), depth, branch).await?;
    Ok(dir)
}
