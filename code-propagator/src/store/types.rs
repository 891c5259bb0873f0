//! Records kept by the config store.

use crate::config::{CopyRule, LockInfo};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Configuration and state of one destination repository.
///
/// Records are only ever replaced whole, through
/// [`ConfigStore::store_config`](super::ConfigStore::store_config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepoConfig {
    /// Copy rules read from the repository's copy-rule file.
    pub copy_rules: Vec<CopyRule>,

    /// Post-processor image declared in the copy-rule file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_processor_image: Option<String>,

    /// Pinned post-processor from the lock file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<LockInfo>,

    /// Destination commit the declarative files were read at. Compare-and-swap key.
    pub commit_hash: String,

    /// Destination branch that pull requests target.
    pub branch_name: String,

    /// App installation used to act on the repository.
    pub installation_id: u64,
}

impl RepoConfig {
    /// The post-processor image this repository uses, if any.
    ///
    /// The declared image wins over the image recorded in the lock file.
    #[must_use]
    pub fn post_processor(&self) -> Option<&str> {
        self.post_processor_image
            .as_deref()
            .or_else(|| self.lock.as_ref().map(|lock| lock.image.as_str()))
    }
}

/// The record version a writer observed before computing its update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// No record existed.
    Absent,

    /// A record with this commit hash existed.
    CommitHash(String),
}

impl ExpectedVersion {
    /// The version matching an observed record.
    #[must_use]
    pub fn of(current: Option<&RepoConfig>) -> Self {
        match current {
            Some(config) => Self::CommitHash(config.commit_hash.clone()),
            None => Self::Absent,
        }
    }

    /// Returns whether a write expecting `self` may replace `current`.
    #[must_use]
    pub fn admits(&self, current: Option<&RepoConfig>) -> bool {
        match (self, current) {
            (Self::Absent, None) => true,
            (Self::CommitHash(expected), Some(config)) => *expected == config.commit_hash,
            _ => false,
        }
    }
}

/// Result of a compare-and-swap write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The record was replaced.
    Written,

    /// Someone else advanced the record first; nothing was changed.
    Conflict,
}

impl WriteOutcome {
    /// Returns true if the write took effect.
    #[must_use]
    pub fn is_written(self) -> bool {
        matches!(self, Self::Written)
    }
}

/// Key of a lock-update record: hex SHA-256 of repo, image and digest.
#[must_use]
pub fn lock_key(repo: &str, lock: &LockInfo) -> String {
    let mut hasher = Sha256::new();
    hasher.update(repo.as_bytes());
    hasher.update([0]);
    hasher.update(lock.image.as_bytes());
    hasher.update([0]);
    hasher.update(lock.digest.as_bytes());
    hex::encode(hasher.finalize())
}
