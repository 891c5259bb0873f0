//! Fakes shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use code_propagator::git::{CommitInfo, GitError, GitExecutor};
use code_propagator::host::{Artifact, CodeHost, CreatedArtifact, HostError, NewPullRequest, RepoName};
use code_propagator::{CopyRule, RepoConfig};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use walkdir::WalkDir;

/// Writes `content` to `root/relative`, creating parents.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Every file below `root` (excluding `.git`) with its content.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git")
        .map(Result::unwrap)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap().to_path_buf();
            (relative, fs::read(entry.path()).unwrap())
        })
        .collect()
}

fn copy_tree(from: &Path, to: &Path) {
    for (relative, content) in snapshot(from) {
        let target = to.join(relative);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, content).unwrap();
    }
}

/// A stored record with the given copy rules.
pub fn repo_config(rules: Vec<CopyRule>) -> RepoConfig {
    RepoConfig {
        copy_rules: rules,
        post_processor_image: None,
        lock: None,
        commit_hash: "dest-head-0".to_string(),
        branch_name: "main".to_string(),
        installation_id: 42,
    }
}

#[derive(Default)]
struct HostState {
    repositories: Vec<RepoName>,
    commits: HashMap<String, Vec<String>>,
    pull_requests: HashMap<String, Vec<Artifact>>,
    issues: HashMap<String, Vec<Artifact>>,
    created_pull_requests: Vec<(String, NewPullRequest)>,
    closed: Vec<(String, u64)>,
    open_heads: HashMap<(String, String), CreatedArtifact>,
    failing: HashSet<String>,
    search_lag: bool,
    next_number: u64,
}

/// In-memory code host.
///
/// Searches see commits and artifacts unless search lag is switched on, in
/// which case only the direct listings see artifacts. Like GitHub, a second
/// open pull request from the same head branch is rejected.
#[derive(Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn new() -> Self {
        let host = Self::default();
        host.state.lock().unwrap().next_number = 100;
        host
    }

    /// Grants access to `repo`.
    pub fn add_repository(&self, repo: &str) {
        let repo: RepoName = repo.parse().unwrap();
        self.state.lock().unwrap().repositories.push(repo);
    }

    /// Records a commit mentioning `marker` in `repo`.
    pub fn add_commit(&self, repo: &str, marker: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .commits
            .entry(repo.to_string())
            .or_default()
            .push(marker.to_string());
    }

    /// Adds a pull request, newest first.
    pub fn add_pull_request(&self, repo: &str, title: &str, body: &str) {
        let mut state = self.state.lock().unwrap();
        let number = state.next_number;
        state.next_number += 1;
        state
            .pull_requests
            .entry(repo.to_string())
            .or_default()
            .insert(0, artifact(number, title, body));
    }

    /// Makes searches miss everything not in a commit.
    pub fn set_search_lag(&self, lag: bool) {
        self.state.lock().unwrap().search_lag = lag;
    }

    /// Makes every call about `repo` fail.
    pub fn fail_repo(&self, repo: &str) {
        self.state.lock().unwrap().failing.insert(repo.to_string());
    }

    pub fn created_pull_requests(&self) -> Vec<(String, NewPullRequest)> {
        self.state.lock().unwrap().created_pull_requests.clone()
    }

    pub fn issues(&self, repo: &str) -> Vec<Artifact> {
        self.state
            .lock()
            .unwrap()
            .issues
            .get(repo)
            .cloned()
            .unwrap_or_default()
    }

    pub fn closed(&self) -> Vec<(String, u64)> {
        self.state.lock().unwrap().closed.clone()
    }

    fn check(&self, repo: &RepoName) -> Result<(), HostError> {
        if self.state.lock().unwrap().failing.contains(&repo.full_name()) {
            return Err(HostError::PermissionDenied {
                repo: repo.full_name(),
            });
        }
        Ok(())
    }
}

fn artifact(number: u64, title: &str, body: &str) -> Artifact {
    Artifact {
        number,
        title: title.to_string(),
        body: body.to_string(),
    }
}

fn count_mentions(artifacts: Option<&Vec<Artifact>>, text: &str) -> u64 {
    artifacts.map_or(0, |list| list.iter().filter(|a| a.mentions(text)).count() as u64)
}

#[async_trait]
impl CodeHost for FakeHost {
    async fn list_repositories(&self) -> Result<Vec<RepoName>, HostError> {
        let mut repos = self.state.lock().unwrap().repositories.clone();
        repos.sort();
        Ok(repos)
    }

    async fn search_commits(&self, repo: &RepoName, text: &str) -> Result<u64, HostError> {
        self.check(repo)?;
        let state = self.state.lock().unwrap();
        Ok(state.commits.get(&repo.full_name()).map_or(0, |markers| {
            markers.iter().filter(|m| m.contains(text)).count() as u64
        }))
    }

    async fn search_issues_and_pull_requests(
        &self,
        repo: &RepoName,
        text: &str,
    ) -> Result<u64, HostError> {
        self.check(repo)?;
        let state = self.state.lock().unwrap();
        if state.search_lag {
            return Ok(0);
        }
        let name = repo.full_name();
        Ok(count_mentions(state.pull_requests.get(&name), text)
            + count_mentions(state.issues.get(&name), text))
    }

    async fn recent_pull_requests(
        &self,
        repo: &RepoName,
        limit: u8,
    ) -> Result<Vec<Artifact>, HostError> {
        self.check(repo)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .pull_requests
            .get(&repo.full_name())
            .map(|list| list.iter().take(limit.into()).cloned().collect())
            .unwrap_or_default())
    }

    async fn recent_issues(&self, repo: &RepoName, limit: u8) -> Result<Vec<Artifact>, HostError> {
        self.check(repo)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .issues
            .get(&repo.full_name())
            .map(|list| list.iter().take(limit.into()).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_open_issue(
        &self,
        repo: &RepoName,
        title: &str,
    ) -> Result<Option<u64>, HostError> {
        self.check(repo)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .issues
            .get(&repo.full_name())
            .and_then(|list| list.iter().find(|issue| issue.title == title))
            .map(|issue| issue.number))
    }

    async fn create_issue(
        &self,
        repo: &RepoName,
        title: &str,
        body: &str,
    ) -> Result<CreatedArtifact, HostError> {
        self.check(repo)?;
        let mut state = self.state.lock().unwrap();
        let number = state.next_number;
        state.next_number += 1;
        state
            .issues
            .entry(repo.full_name())
            .or_default()
            .insert(0, artifact(number, title, body));
        Ok(CreatedArtifact {
            number,
            url: format!("https://github.com/{repo}/issues/{number}"),
        })
    }

    async fn create_pull_request(
        &self,
        repo: &RepoName,
        request: &NewPullRequest,
    ) -> Result<CreatedArtifact, HostError> {
        self.check(repo)?;
        let mut state = self.state.lock().unwrap();
        let key = (repo.full_name(), request.head.clone());
        if state.open_heads.contains_key(&key) {
            return Err(HostError::PullRequestExists {
                repo: repo.full_name(),
                head: request.head.clone(),
            });
        }
        let number = state.next_number;
        state.next_number += 1;
        state
            .pull_requests
            .entry(repo.full_name())
            .or_default()
            .insert(0, artifact(number, &request.title, &request.body));
        state
            .created_pull_requests
            .push((repo.full_name(), request.clone()));
        let created = CreatedArtifact {
            number,
            url: format!("https://github.com/{repo}/pull/{number}"),
        };
        state.open_heads.insert(key, created.clone());
        Ok(created)
    }

    async fn find_open_pull_request(
        &self,
        repo: &RepoName,
        head: &str,
    ) -> Result<Option<CreatedArtifact>, HostError> {
        self.check(repo)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .open_heads
            .get(&(repo.full_name(), head.to_string()))
            .cloned())
    }

    async fn close_pull_request(&self, repo: &RepoName, number: u64) -> Result<(), HostError> {
        self.check(repo)?;
        let mut state = self.state.lock().unwrap();
        let name = repo.full_name();
        state
            .open_heads
            .retain(|(open_repo, _), pr| !(open_repo == &name && pr.number == number));
        state.closed.push((name, number));
        Ok(())
    }
}

/// A commit of the fake source history.
#[derive(Debug, Clone)]
pub struct FakeCommit {
    pub info: CommitInfo,
    pub files: Vec<String>,
}

impl FakeCommit {
    pub fn new(hash: &str, message: &str, files: &[&str]) -> Self {
        Self {
            info: CommitInfo {
                hash: hash.to_string(),
                message: message.to_string(),
            },
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }
}

#[derive(Default)]
struct GitState {
    origins: HashMap<PathBuf, PathBuf>,
    examined: Vec<String>,
    checkouts: Vec<String>,
    branches: Vec<String>,
    commits: Vec<String>,
    pushes: Vec<(String, String)>,
    clones: Vec<(String, Option<usize>)>,
}

/// Git executor over local fixture directories.
///
/// Cloning a URL registered with [`FakeGit::add_remote`] copies the fixture
/// directory; any other URL yields an empty checkout. Source history is the
/// scripted list of commits, newest first.
#[derive(Default)]
pub struct FakeGit {
    remotes: HashMap<String, PathBuf>,
    history: Vec<FakeCommit>,
    head: String,
    state: Mutex<GitState>,
}

impl FakeGit {
    pub fn new(history: Vec<FakeCommit>) -> Self {
        Self {
            history,
            head: "dest-head-1".to_string(),
            ..Default::default()
        }
    }

    pub fn add_remote(&mut self, url: impl Into<String>, fixture: &Path) {
        self.remotes.insert(url.into(), fixture.to_path_buf());
    }

    /// Commit hashes whose changed files were requested, in order.
    pub fn examined(&self) -> Vec<String> {
        self.state.lock().unwrap().examined.clone()
    }

    pub fn commits(&self) -> Vec<String> {
        self.state.lock().unwrap().commits.clone()
    }

    pub fn pushes(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().pushes.clone()
    }

    pub fn clones(&self) -> Vec<(String, Option<usize>)> {
        self.state.lock().unwrap().clones.clone()
    }

    pub fn checkouts(&self) -> Vec<String> {
        self.state.lock().unwrap().checkouts.clone()
    }
}

#[async_trait]
impl GitExecutor for FakeGit {
    async fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        depth: Option<usize>,
        _branch: Option<&str>,
    ) -> Result<(), GitError> {
        let mut state = self.state.lock().unwrap();
        state.clones.push((url.to_string(), depth));
        if let Some(fixture) = self.remotes.get(url) {
            copy_tree(fixture, dest);
            state.origins.insert(dest.to_path_buf(), fixture.clone());
        }
        Ok(())
    }

    async fn log(
        &self,
        _repo: &Path,
        rev: &str,
        max_count: usize,
    ) -> Result<Vec<CommitInfo>, GitError> {
        let start = if rev == "HEAD" {
            0
        } else {
            self.history
                .iter()
                .position(|commit| commit.info.hash == rev)
                .unwrap_or(self.history.len())
        };
        Ok(self.history[start..]
            .iter()
            .take(max_count)
            .map(|commit| commit.info.clone())
            .collect())
    }

    async fn changed_files(&self, _repo: &Path, commit: &str) -> Result<Vec<String>, GitError> {
        self.state.lock().unwrap().examined.push(commit.to_string());
        Ok(self
            .history
            .iter()
            .find(|c| c.info.hash == commit)
            .map(|c| c.files.clone())
            .unwrap_or_default())
    }

    async fn checkout(&self, _repo: &Path, rev: &str) -> Result<(), GitError> {
        self.state.lock().unwrap().checkouts.push(rev.to_string());
        Ok(())
    }

    async fn create_branch(&self, _repo: &Path, branch: &str) -> Result<(), GitError> {
        self.state.lock().unwrap().branches.push(branch.to_string());
        Ok(())
    }

    async fn head(&self, _repo: &Path) -> Result<String, GitError> {
        Ok(self.head.clone())
    }

    async fn current_branch(&self, _repo: &Path) -> Result<String, GitError> {
        Ok("main".to_string())
    }

    async fn has_changes(&self, repo: &Path) -> Result<bool, GitError> {
        let origin = self.state.lock().unwrap().origins.get(repo).cloned();
        Ok(match origin {
            Some(origin) => snapshot(repo) != snapshot(&origin),
            None => !snapshot(repo).is_empty(),
        })
    }

    async fn commit_all(&self, _repo: &Path, message: &str) -> Result<(), GitError> {
        self.state.lock().unwrap().commits.push(message.to_string());
        Ok(())
    }

    async fn push(&self, _repo: &Path, remote_url: &str, branch: &str) -> Result<(), GitError> {
        self.state
            .lock()
            .unwrap()
            .pushes
            .push((remote_url.to_string(), branch.to_string()));
        Ok(())
    }
}
