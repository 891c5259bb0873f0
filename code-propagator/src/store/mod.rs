//! Durable per-repository configuration with optimistic concurrency.
//!
//! All writers follow the same protocol: read the current record, compute a
//! replacement, then write it with the [`ExpectedVersion`] they observed. A
//! [`WriteOutcome::Conflict`] means another writer advanced the record first;
//! callers re-read and decide whether to retry or skip. It is never an error.

mod error;
mod file;
mod memory;
mod types;

pub use error::StoreError;
pub use file::FileConfigStore;
pub use memory::MemoryConfigStore;
pub use types::{lock_key, ExpectedVersion, RepoConfig, WriteOutcome};

use crate::config::LockInfo;
use crate::paths::PathMatcher;
use async_trait::async_trait;

/// Storage of [`RepoConfig`] records and lock-update bookkeeping.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Reads the record of `repo`.
    async fn get_config(&self, repo: &str) -> Result<Option<RepoConfig>, StoreError>;

    /// Replaces the record of `repo` if its current version is `expected`.
    async fn store_config(
        &self,
        repo: &str,
        config: RepoConfig,
        expected: &ExpectedVersion,
    ) -> Result<WriteOutcome, StoreError>;

    /// Lists every record, sorted by repository name.
    async fn list_configs(&self) -> Result<Vec<(String, RepoConfig)>, StoreError>;

    /// Repositories with at least one copy rule matching at least one of `paths`.
    async fn find_repos_affected_by_file_changes(
        &self,
        paths: &[String],
    ) -> Result<Vec<String>, StoreError> {
        let configs = self.list_configs().await?;
        Ok(repos_affected_by(&configs, paths))
    }

    /// Repositories whose post-processor is `image`.
    async fn find_repos_with_post_processor(
        &self,
        image: &str,
    ) -> Result<Vec<(String, RepoConfig)>, StoreError> {
        Ok(self
            .list_configs()
            .await?
            .into_iter()
            .filter(|(_, config)| config.post_processor() == Some(image))
            .collect())
    }

    /// The pull request recorded for moving `repo` to `lock`, if any.
    async fn find_pull_request_for_updating_lock(
        &self,
        repo: &str,
        lock: &LockInfo,
    ) -> Result<Option<String>, StoreError>;

    /// Records `pull_request` for moving `repo` to `lock` unless one is already
    /// recorded. Returns the recorded id, which is the earlier one on a race.
    async fn record_pull_request_for_updating_lock(
        &self,
        repo: &str,
        lock: &LockInfo,
        pull_request: &str,
    ) -> Result<String, StoreError>;

    /// Remembers that copying `commit` into `repo` left the destination
    /// unchanged, so later scans count the pair as up to date.
    async fn record_unchanged_commit(&self, repo: &str, commit: &str) -> Result<(), StoreError>;

    /// Whether `commit` was recorded as unchanged for `repo`.
    async fn is_unchanged_commit(&self, repo: &str, commit: &str) -> Result<bool, StoreError>;
}

/// Filters `configs` down to repositories whose subtree-normalized copy rules
/// match any of `paths`.
#[must_use]
pub fn repos_affected_by(configs: &[(String, RepoConfig)], paths: &[String]) -> Vec<String> {
    configs
        .iter()
        .filter(|(_, config)| {
            config.copy_rules.iter().any(|rule| {
                let matcher = PathMatcher::subtree(&rule.source);
                paths.iter().any(|path| matcher.matches(path))
            })
        })
        .map(|(repo, _)| repo.clone())
        .collect()
}
