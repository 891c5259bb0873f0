//! In-process config store.

use super::{lock_key, ConfigStore, ExpectedVersion, RepoConfig, StoreError, WriteOutcome};
use crate::config::LockInfo;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryState {
    configs: BTreeMap<String, RepoConfig>,
    lock_pull_requests: HashMap<String, String>,
    unchanged_commits: HashSet<(String, String)>,
}

/// A [`ConfigStore`] held in memory. Useful for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    state: Mutex<MemoryState>,
}

impl MemoryConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get_config(&self, repo: &str) -> Result<Option<RepoConfig>, StoreError> {
        Ok(self.state.lock().await.configs.get(repo).cloned())
    }

    async fn store_config(
        &self,
        repo: &str,
        config: RepoConfig,
        expected: &ExpectedVersion,
    ) -> Result<WriteOutcome, StoreError> {
        let mut state = self.state.lock().await;
        if !expected.admits(state.configs.get(repo)) {
            debug!(repo, ?expected, "Mid-air collision on config write");
            return Ok(WriteOutcome::Conflict);
        }
        state.configs.insert(repo.to_string(), config);
        Ok(WriteOutcome::Written)
    }

    async fn list_configs(&self) -> Result<Vec<(String, RepoConfig)>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .configs
            .iter()
            .map(|(repo, config)| (repo.clone(), config.clone()))
            .collect())
    }

    async fn find_pull_request_for_updating_lock(
        &self,
        repo: &str,
        lock: &LockInfo,
    ) -> Result<Option<String>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.lock_pull_requests.get(&lock_key(repo, lock)).cloned())
    }

    async fn record_pull_request_for_updating_lock(
        &self,
        repo: &str,
        lock: &LockInfo,
        pull_request: &str,
    ) -> Result<String, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state
            .lock_pull_requests
            .entry(lock_key(repo, lock))
            .or_insert_with(|| pull_request.to_string())
            .clone())
    }

    async fn record_unchanged_commit(&self, repo: &str, commit: &str) -> Result<(), StoreError> {
        self.state
            .lock()
            .await
            .unchanged_commits
            .insert((repo.to_string(), commit.to_string()));
        Ok(())
    }

    async fn is_unchanged_commit(&self, repo: &str, commit: &str) -> Result<bool, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .unchanged_commits
            .contains(&(repo.to_string(), commit.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CopyRule;

    fn config(commit_hash: &str) -> RepoConfig {
        RepoConfig {
            copy_rules: vec![CopyRule::new("/google/cloud/speech", "src")],
            post_processor_image: Some("gcr.io/pp".to_string()),
            lock: None,
            commit_hash: commit_hash.to_string(),
            branch_name: "main".to_string(),
            installation_id: 7,
        }
    }

    #[tokio::test]
    async fn first_write_requires_absent() {
        let store = MemoryConfigStore::new();

        let stale = store
            .store_config("o/r", config("a"), &ExpectedVersion::CommitHash("x".into()))
            .await
            .unwrap();
        assert_eq!(stale, WriteOutcome::Conflict);
        assert!(store.get_config("o/r").await.unwrap().is_none());

        let first = store
            .store_config("o/r", config("a"), &ExpectedVersion::Absent)
            .await
            .unwrap();
        assert_eq!(first, WriteOutcome::Written);
        assert_eq!(store.get_config("o/r").await.unwrap(), Some(config("a")));
    }

    #[tokio::test]
    async fn concurrent_writers_with_same_expectation_have_one_winner() {
        let store = MemoryConfigStore::new();
        store
            .store_config("o/r", config("base"), &ExpectedVersion::Absent)
            .await
            .unwrap();
        let expected = ExpectedVersion::CommitHash("base".into());

        let (left, right) = tokio::join!(
            store.store_config("o/r", config("left"), &expected),
            store.store_config("o/r", config("right"), &expected),
        );
        let outcomes = [left.unwrap(), right.unwrap()];

        assert_eq!(
            outcomes.iter().filter(|o| o.is_written()).count(),
            1,
            "exactly one writer must win: {outcomes:?}"
        );

        let winner = if outcomes[0].is_written() { "left" } else { "right" };
        let reread = store.get_config("o/r").await.unwrap().unwrap();
        assert_eq!(reread.commit_hash, winner);
    }

    #[tokio::test]
    async fn finds_repos_by_post_processor() {
        let store = MemoryConfigStore::new();
        store
            .store_config("o/r", config("a"), &ExpectedVersion::Absent)
            .await
            .unwrap();

        let found = store.find_repos_with_post_processor("gcr.io/pp").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "o/r");
        assert!(store
            .find_repos_with_post_processor("gcr.io/other")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn lock_pull_request_first_recorder_wins() {
        let store = MemoryConfigStore::new();
        let lock = LockInfo::new("gcr.io/pp", "sha256:1");

        assert!(store
            .find_pull_request_for_updating_lock("o/r", &lock)
            .await
            .unwrap()
            .is_none());

        let first = store
            .record_pull_request_for_updating_lock("o/r", &lock, "https://x/pull/1")
            .await
            .unwrap();
        let second = store
            .record_pull_request_for_updating_lock("o/r", &lock, "https://x/pull/2")
            .await
            .unwrap();

        assert_eq!(first, "https://x/pull/1");
        assert_eq!(second, "https://x/pull/1");
        assert_eq!(
            store
                .find_pull_request_for_updating_lock("o/r", &lock)
                .await
                .unwrap()
                .as_deref(),
            Some("https://x/pull/1")
        );
    }
}
