//! Config store persisted as a single JSON document.
//!
//! Every operation re-reads the document, so writes made by earlier runs are
//! always observed. Each operation holds an advisory lock on `<path>.lock`
//! for its whole read-check-write, so separate processes sharing a document
//! see compare-and-swap semantics. Writes go through a uniquely named
//! temporary file in the same directory and are renamed into place.

use super::{lock_key, ConfigStore, ExpectedVersion, RepoConfig, StoreError, WriteOutcome};
use crate::config::LockInfo;
use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct StoreDocument {
    #[serde(default)]
    repos: BTreeMap<String, RepoConfig>,
    #[serde(default)]
    lock_pull_requests: BTreeMap<String, String>,
    #[serde(default)]
    unchanged_commits: BTreeMap<String, BTreeSet<String>>,
}

/// Advisory lock on the document, released when dropped.
#[derive(Debug)]
struct DocumentLock {
    _file: File,
}

#[derive(Debug, Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

/// `state.json` locks through `state.json.lock`.
fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn acquire(path: &Path, mode: LockMode) -> io::Result<DocumentLock> {
    fs::create_dir_all(parent_dir(path))?;
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path_for(path))?;

    // Qualified so newer toolchains do not pick `std::fs::File::lock_*`.
    match mode {
        LockMode::Shared => FileExt::lock_shared(&file)?,
        LockMode::Exclusive => FileExt::lock_exclusive(&file)?,
    }
    Ok(DocumentLock { _file: file })
}

fn replace_document(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// A [`ConfigStore`] backed by a JSON file.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Opens (lazily creating) the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Blocks (off the runtime) until the document lock is held.
    async fn lock(&self, mode: LockMode) -> Result<DocumentLock, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || acquire(&path, mode))
            .await?
            .map_err(|e| self.io_error(e))
    }

    async fn read(&self) -> Result<StoreDocument, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(StoreDocument::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Must be called with an exclusive [`DocumentLock`] held.
    async fn write(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(document)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || replace_document(&path, &json))
            .await?
            .map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get_config(&self, repo: &str) -> Result<Option<RepoConfig>, StoreError> {
        let _lock = self.lock(LockMode::Shared).await?;
        Ok(self.read().await?.repos.remove(repo))
    }

    async fn store_config(
        &self,
        repo: &str,
        config: RepoConfig,
        expected: &ExpectedVersion,
    ) -> Result<WriteOutcome, StoreError> {
        let _lock = self.lock(LockMode::Exclusive).await?;
        let mut document = self.read().await?;

        if !expected.admits(document.repos.get(repo)) {
            debug!(repo, ?expected, "Mid-air collision on config write");
            return Ok(WriteOutcome::Conflict);
        }

        info!(repo, commit_hash = %config.commit_hash, "Storing repository config");
        document.repos.insert(repo.to_string(), config);
        self.write(&document).await?;
        Ok(WriteOutcome::Written)
    }

    async fn list_configs(&self) -> Result<Vec<(String, RepoConfig)>, StoreError> {
        let _lock = self.lock(LockMode::Shared).await?;
        Ok(self.read().await?.repos.into_iter().collect())
    }

    async fn find_pull_request_for_updating_lock(
        &self,
        repo: &str,
        lock: &LockInfo,
    ) -> Result<Option<String>, StoreError> {
        let _lock = self.lock(LockMode::Shared).await?;
        Ok(self
            .read()
            .await?
            .lock_pull_requests
            .remove(&lock_key(repo, lock)))
    }

    async fn record_pull_request_for_updating_lock(
        &self,
        repo: &str,
        lock: &LockInfo,
        pull_request: &str,
    ) -> Result<String, StoreError> {
        let _lock = self.lock(LockMode::Exclusive).await?;
        let mut document = self.read().await?;
        let key = lock_key(repo, lock);

        if let Some(existing) = document.lock_pull_requests.get(&key) {
            return Ok(existing.clone());
        }

        document
            .lock_pull_requests
            .insert(key, pull_request.to_string());
        self.write(&document).await?;
        Ok(pull_request.to_string())
    }

    async fn record_unchanged_commit(&self, repo: &str, commit: &str) -> Result<(), StoreError> {
        let _lock = self.lock(LockMode::Exclusive).await?;
        let mut document = self.read().await?;
        let inserted = document
            .unchanged_commits
            .entry(repo.to_string())
            .or_default()
            .insert(commit.to_string());
        if inserted {
            self.write(&document).await?;
        }
        Ok(())
    }

    async fn is_unchanged_commit(&self, repo: &str, commit: &str) -> Result<bool, StoreError> {
        let _lock = self.lock(LockMode::Shared).await?;
        Ok(self
            .read()
            .await?
            .unchanged_commits
            .get(repo)
            .is_some_and(|commits| commits.contains(commit)))
    }
}
