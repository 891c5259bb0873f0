//! [`GitExecutor`] backed by the `git` binary.

use super::{CommitInfo, GitError, GitExecutor};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Separates commits in `git log` output.
const RECORD_SEPARATOR: char = '\u{1e}';

/// Separates hash from message in `git log` output.
const FIELD_SEPARATOR: char = '\u{0}';

/// Emits [`FIELD_SEPARATOR`] and [`RECORD_SEPARATOR`] through git's own
/// placeholders; process arguments cannot carry a NUL byte.
const LOG_FORMAT: &str = "--format=%H%x00%B%x1e";

/// Runs the `git` binary.
#[derive(Debug, Clone)]
pub struct CommandGit {
    user_name: String,
    user_email: String,
}

impl Default for CommandGit {
    fn default() -> Self {
        Self::new("Code Propagation Bot", "bot@code-propagator")
    }
}

impl CommandGit {
    /// Creates an executor committing as the given identity.
    pub fn new(user_name: impl Into<String>, user_email: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            user_email: user_email.into(),
        }
    }

    /// Runs a git command in `path` and returns its stdout.
    async fn run(&self, path: &Path, args: &[&str]) -> Result<String, GitError> {
        let command = args.first().copied().unwrap_or_default().to_string();
        debug!(path = %path.display(), command = %command, "Running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| GitError::Spawn {
                command: command.clone(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::Failed {
                command,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl GitExecutor for CommandGit {
    async fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        depth: Option<usize>,
        branch: Option<&str>,
    ) -> Result<(), GitError> {
        let depth = depth.map(|d| d.to_string());
        let mut args = vec!["clone"];
        if let Some(depth) = depth.as_deref() {
            args.extend(["--depth", depth]);
        }
        if let Some(branch) = branch {
            args.extend(["--branch", branch]);
        }
        args.extend([url, "."]);
        self.run(dest, &args).await.map(drop)
    }

    async fn log(
        &self,
        repo: &Path,
        rev: &str,
        max_count: usize,
    ) -> Result<Vec<CommitInfo>, GitError> {
        let max_count = max_count.to_string();
        let stdout = self
            .run(repo, &["log", "-n", &max_count, LOG_FORMAT, rev, "--"])
            .await?;
        parse_log(&stdout)
    }

    async fn changed_files(&self, repo: &Path, commit: &str) -> Result<Vec<String>, GitError> {
        let stdout = self
            .run(
                repo,
                &["diff-tree", "--no-commit-id", "--name-only", "-r", "--root", commit],
            )
            .await?;
        Ok(stdout
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn checkout(&self, repo: &Path, rev: &str) -> Result<(), GitError> {
        self.run(repo, &["checkout", "--detach", rev]).await.map(drop)
    }

    async fn create_branch(&self, repo: &Path, branch: &str) -> Result<(), GitError> {
        self.run(repo, &["checkout", "-b", branch]).await.map(drop)
    }

    async fn head(&self, repo: &Path) -> Result<String, GitError> {
        let stdout = self.run(repo, &["rev-parse", "HEAD"]).await?;
        Ok(stdout.trim().to_string())
    }

    async fn current_branch(&self, repo: &Path) -> Result<String, GitError> {
        let stdout = self
            .run(repo, &["rev-parse", "--abbrev-ref", "HEAD"])
            .await?;
        Ok(stdout.trim().to_string())
    }

    async fn has_changes(&self, repo: &Path) -> Result<bool, GitError> {
        let stdout = self.run(repo, &["status", "--porcelain"]).await?;
        Ok(!stdout.trim().is_empty())
    }

    async fn commit_all(&self, repo: &Path, message: &str) -> Result<(), GitError> {
        self.run(repo, &["config", "user.email", &self.user_email])
            .await?;
        self.run(repo, &["config", "user.name", &self.user_name])
            .await?;
        self.run(repo, &["add", "-A"]).await?;
        self.run(repo, &["commit", "-m", message]).await.map(drop)
    }

    async fn push(&self, repo: &Path, remote_url: &str, branch: &str) -> Result<(), GitError> {
        let refspec = format!("HEAD:refs/heads/{branch}");
        self.run(repo, &["push", "--force", remote_url, &refspec])
            .await
            .map(drop)
    }
}

/// Parses `git log --format=%H%x00%B%x1e` output.
fn parse_log(stdout: &str) -> Result<Vec<CommitInfo>, GitError> {
    stdout
        .split(RECORD_SEPARATOR)
        .map(|record| record.trim_start_matches('\n'))
        .filter(|record| !record.trim().is_empty())
        .map(|record| {
            let (hash, message) =
                record
                    .split_once(FIELD_SEPARATOR)
                    .ok_or_else(|| GitError::UnexpectedOutput {
                        command: "log".to_string(),
                        message: format!("missing field separator in {record:?}"),
                    })?;
            Ok(CommitInfo {
                hash: hash.trim().to_string(),
                message: message.trim_end().to_string(),
            })
        })
        .collect()
}
