//! Detection of propagation work that already happened.
//!
//! A source commit counts as propagated into a destination repository once
//! its hash shows up in that repository's commits, issues or pull requests.
//! The hash normally arrives there through the `Source-Link` trailer of a
//! propagation commit, which the host copies into the pull request body.

use crate::host::{CodeHost, HostError, RepoName};
use tracing::{debug, info_span, Instrument};

/// Default number of recent pull requests and issues enumerated directly.
pub const DEFAULT_RECENT_LIMIT: u8 = 20;

/// One way of looking for a propagation marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationCheck {
    /// Commit search for the hash.
    CommitSearch,

    /// Issue and pull request search for the hash.
    IssueSearch,

    /// Title and body of the most recent pull requests.
    RecentPullRequests,

    /// Title and body of the most recent issues.
    RecentIssues,
}

impl PropagationCheck {
    /// Every check, cheapest and most authoritative first.
    ///
    /// The listing checks come last; they catch artifacts created after the
    /// search index was last refreshed.
    pub const DEFAULT_ORDER: [Self; 4] = [
        Self::CommitSearch,
        Self::IssueSearch,
        Self::RecentPullRequests,
        Self::RecentIssues,
    ];

    /// Short name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CommitSearch => "commit_search",
            Self::IssueSearch => "issue_search",
            Self::RecentPullRequests => "recent_pull_requests",
            Self::RecentIssues => "recent_issues",
        }
    }
}

/// Runs an ordered list of [`PropagationCheck`]s against a code host.
pub struct DedupChecker<'a> {
    host: &'a dyn CodeHost,
    recent_limit: u8,
    checks: Vec<PropagationCheck>,
}

impl<'a> DedupChecker<'a> {
    /// Creates a checker running [`PropagationCheck::DEFAULT_ORDER`].
    pub fn new(host: &'a dyn CodeHost) -> Self {
        Self {
            host,
            recent_limit: DEFAULT_RECENT_LIMIT,
            checks: PropagationCheck::DEFAULT_ORDER.to_vec(),
        }
    }

    /// Sets how many recent pull requests and issues are enumerated.
    #[must_use]
    pub fn with_recent_limit(mut self, recent_limit: u8) -> Self {
        self.recent_limit = recent_limit;
        self
    }

    /// Replaces the list of checks run, in order.
    #[must_use]
    pub fn with_checks(mut self, checks: Vec<PropagationCheck>) -> Self {
        self.checks = checks;
        self
    }

    /// Checks run, in order.
    #[must_use]
    pub fn checks(&self) -> &[PropagationCheck] {
        &self.checks
    }

    /// Returns whether `source_commit_hash` was already propagated into `repo`.
    ///
    /// Stops at the first check that finds a marker.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] if a host call fails. Callers must treat that as
    /// "unknown", never as "not propagated".
    pub async fn already_propagated(
        &self,
        repo: &RepoName,
        source_commit_hash: &str,
    ) -> Result<bool, HostError> {
        let span = info_span!("already_propagated", repo = %repo, commit = %source_commit_hash);

        async {
            for check in &self.checks {
                if self.run_check(*check, repo, source_commit_hash).await? {
                    debug!(check = check.as_str(), "Found propagation marker");
                    return Ok(true);
                }
            }
            debug!("No propagation marker found");
            Ok(false)
        }
        .instrument(span)
        .await
    }

    async fn run_check(
        &self,
        check: PropagationCheck,
        repo: &RepoName,
        hash: &str,
    ) -> Result<bool, HostError> {
        Ok(match check {
            PropagationCheck::CommitSearch => self.host.search_commits(repo, hash).await? > 0,
            PropagationCheck::IssueSearch => {
                self.host.search_issues_and_pull_requests(repo, hash).await? > 0
            }
            PropagationCheck::RecentPullRequests => self
                .host
                .recent_pull_requests(repo, self.recent_limit)
                .await?
                .iter()
                .any(|pr| pr.mentions(hash)),
            PropagationCheck::RecentIssues => self
                .host
                .recent_issues(repo, self.recent_limit)
                .await?
                .iter()
                .any(|issue| issue.mentions(hash)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Artifact, CreatedArtifact, NewPullRequest};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Host whose searches and listings return canned data and record calls.
    #[derive(Default)]
    struct ScriptedHost {
        commit_hits: u64,
        issue_hits: u64,
        pull_requests: Vec<Artifact>,
        issues: Vec<Artifact>,
        fail_commit_search: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    impl ScriptedHost {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CodeHost for ScriptedHost {
        async fn search_commits(&self, _: &RepoName, _: &str) -> Result<u64, HostError> {
            self.record("commits");
            if self.fail_commit_search {
                return Err(HostError::PermissionDenied {
                    repo: "o/r".to_string(),
                });
            }
            Ok(self.commit_hits)
        }

        async fn search_issues_and_pull_requests(
            &self,
            _: &RepoName,
            _: &str,
        ) -> Result<u64, HostError> {
            self.record("issues_and_prs");
            Ok(self.issue_hits)
        }

        async fn recent_pull_requests(
            &self,
            _: &RepoName,
            limit: u8,
        ) -> Result<Vec<Artifact>, HostError> {
            self.record("recent_prs");
            Ok(self.pull_requests.iter().take(limit.into()).cloned().collect())
        }

        async fn recent_issues(&self, _: &RepoName, limit: u8) -> Result<Vec<Artifact>, HostError> {
            self.record("recent_issues");
            Ok(self.issues.iter().take(limit.into()).cloned().collect())
        }

        async fn find_open_issue(&self, _: &RepoName, _: &str) -> Result<Option<u64>, HostError> {
            Ok(None)
        }

        async fn create_issue(
            &self,
            _: &RepoName,
            _: &str,
            _: &str,
        ) -> Result<CreatedArtifact, HostError> {
            unreachable!("dedup never creates issues")
        }

        async fn create_pull_request(
            &self,
            _: &RepoName,
            _: &NewPullRequest,
        ) -> Result<CreatedArtifact, HostError> {
            unreachable!("dedup never creates pull requests")
        }

        async fn list_repositories(&self) -> Result<Vec<RepoName>, HostError> {
            unreachable!("dedup never lists repositories")
        }

        async fn find_open_pull_request(
            &self,
            _: &RepoName,
            _: &str,
        ) -> Result<Option<CreatedArtifact>, HostError> {
            unreachable!("dedup never looks up pull requests by head")
        }

        async fn close_pull_request(&self, _: &RepoName, _: u64) -> Result<(), HostError> {
            unreachable!("dedup never closes pull requests")
        }
    }

    fn artifact(number: u64, title: &str, body: &str) -> Artifact {
        Artifact {
            number,
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    fn repo() -> RepoName {
        RepoName::new("googleapis", "java-speech")
    }

    #[tokio::test]
    async fn commit_search_hit_short_circuits() {
        let host = ScriptedHost {
            commit_hits: 1,
            ..Default::default()
        };
        let checker = DedupChecker::new(&host);

        assert!(checker.already_propagated(&repo(), "abc123").await.unwrap());
        assert_eq!(host.calls(), vec!["commits"]);
    }

    #[tokio::test]
    async fn listing_fallback_finds_marker_missed_by_search() {
        let host = ScriptedHost {
            pull_requests: vec![
                artifact(7, "chore: unrelated", ""),
                artifact(8, "feat: add speech v2", "Source-Link: https://github.com/g/gen/commit/abc123"),
            ],
            ..Default::default()
        };
        let checker = DedupChecker::new(&host);

        assert!(checker.already_propagated(&repo(), "abc123").await.unwrap());
        assert_eq!(host.calls(), vec!["commits", "issues_and_prs", "recent_prs"]);
    }

    #[tokio::test]
    async fn recent_issues_are_checked_last() {
        let host = ScriptedHost {
            issues: vec![artifact(3, "propagation failed for abc123", "")],
            ..Default::default()
        };
        let checker = DedupChecker::new(&host);

        assert!(checker.already_propagated(&repo(), "abc123").await.unwrap());
        assert_eq!(
            host.calls(),
            vec!["commits", "issues_and_prs", "recent_prs", "recent_issues"]
        );
    }

    #[tokio::test]
    async fn nothing_found_is_not_propagated() {
        let host = ScriptedHost {
            pull_requests: vec![artifact(1, "unrelated", "def456")],
            ..Default::default()
        };
        let checker = DedupChecker::new(&host);

        assert!(!checker.already_propagated(&repo(), "abc123").await.unwrap());
    }

    #[tokio::test]
    async fn recent_limit_bounds_enumeration() {
        let host = ScriptedHost {
            pull_requests: vec![artifact(2, "new", ""), artifact(1, "old abc123", "")],
            ..Default::default()
        };
        let checker = DedupChecker::new(&host).with_recent_limit(1);

        assert!(!checker.already_propagated(&repo(), "abc123").await.unwrap());
    }

    #[tokio::test]
    async fn custom_check_list_is_respected() {
        let host = ScriptedHost {
            commit_hits: 1,
            ..Default::default()
        };
        let checker = DedupChecker::new(&host).with_checks(vec![PropagationCheck::RecentIssues]);

        assert!(!checker.already_propagated(&repo(), "abc123").await.unwrap());
        assert_eq!(host.calls(), vec!["recent_issues"]);
    }

    #[tokio::test]
    async fn host_errors_propagate() {
        let host = ScriptedHost {
            fail_commit_search: true,
            issue_hits: 1,
            ..Default::default()
        };
        let checker = DedupChecker::new(&host);

        assert!(checker.already_propagated(&repo(), "abc123").await.is_err());
    }
}
