//! Walks source history to find propagation work.
//!
//! The scanner reads the newest commits of the source repository, asks the
//! config store which destination repositories each commit touches, and
//! queues every (repository, commit) pair the [`DedupChecker`] cannot find a
//! marker for. The queue is returned oldest first so pull requests are
//! opened in commit order.

mod error;
mod todo;

pub use error::ScanError;
pub use todo::Todo;

use crate::dedup::DedupChecker;
use crate::git::{clone_to_temp, CommitInfo, GitExecutor};
use crate::host::RepoName;
use crate::paths::rooted;
use crate::propagate::Propagator;
use crate::store::ConfigStore;
use crate::summary::RunSummary;
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, info, info_span, warn, Instrument};

/// Whether scanning stops at the first fully propagated commit.
///
/// With [`EarlyStop::Enabled`] the scan assumes that once every repository a
/// commit affects has that commit, every older commit was handled too. The
/// assumption breaks if copy rules gain new sources after the fact; such
/// history is only picked up with [`EarlyStop::Disabled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EarlyStop {
    /// Stop at the first commit whose affected repositories are all up to date.
    #[default]
    Enabled,

    /// Examine every commit up to the depth limit.
    Disabled,
}

impl From<bool> for EarlyStop {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

/// A shallow clone of the source repository.
pub struct SourceCheckout {
    dir: TempDir,
}

impl SourceCheckout {
    /// Clones `url` deep enough to scan `max_depth` commits.
    ///
    /// The oldest commit of a shallow clone is a graft without parents, so its
    /// diff would list every file. One extra commit is fetched and never scanned.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the clone fails.
    pub async fn fetch(
        git: &dyn GitExecutor,
        url: &str,
        max_depth: usize,
    ) -> Result<Self, ScanError> {
        let dir = clone_to_temp(git, url, Some(max_depth + 1), None).await?;
        Ok(Self { dir })
    }

    /// Root of the checkout.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// What [`CommitScanner::build_todo_queue`] found.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Pending work, oldest commit first.
    pub queue: Vec<Todo>,

    /// Number of commits examined.
    pub commits_scanned: usize,

    /// Whether the scan ended at a fully propagated commit.
    pub stopped_early: bool,
}

/// How the repositories affected by one commit stand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CommitTally {
    affected: usize,
    up_to_date: usize,
}

impl CommitTally {
    /// The commit touched at least one repository and every one of them
    /// provably has it. Repositories whose check failed are not up to date.
    fn fully_propagated(self) -> bool {
        self.affected > 0 && self.up_to_date == self.affected
    }
}

/// Builds the propagation work queue from source history.
pub struct CommitScanner<'a> {
    git: &'a dyn GitExecutor,
    store: &'a dyn ConfigStore,
    dedup: &'a DedupChecker<'a>,
    early_stop: EarlyStop,
}

impl<'a> CommitScanner<'a> {
    /// Creates a scanner with [`EarlyStop::Enabled`].
    pub fn new(
        git: &'a dyn GitExecutor,
        store: &'a dyn ConfigStore,
        dedup: &'a DedupChecker<'a>,
    ) -> Self {
        Self {
            git,
            store,
            dedup,
            early_stop: EarlyStop::Enabled,
        }
    }

    /// Sets the early-stop policy.
    #[must_use]
    pub fn with_early_stop(mut self, early_stop: EarlyStop) -> Self {
        self.early_stop = early_stop;
        self
    }

    /// Examines up to `max_depth` commits of `source`, newest first, and
    /// returns the pending work oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if reading history or querying the store fails.
    /// Failed existence checks for single repositories are logged and leave
    /// those repositories out of the queue.
    pub async fn build_todo_queue(
        &self,
        source: &SourceCheckout,
        max_depth: usize,
    ) -> Result<ScanReport, ScanError> {
        let span = info_span!("build_todo_queue", max_depth, early_stop = ?self.early_stop);

        async {
            let commits = self.git.log(source.path(), "HEAD", max_depth).await?;
            info!(count = commits.len(), "Scanning source commits");

            let mut report = ScanReport::default();
            for commit in &commits {
                report.commits_scanned += 1;
                let tally = self
                    .scan_commit(source.path(), commit, &mut report.queue)
                    .await?;

                if self.early_stop == EarlyStop::Enabled && tally.fully_propagated() {
                    info!(
                        commit = %commit.hash,
                        "Every affected repository is up to date, stopping"
                    );
                    report.stopped_early = true;
                    break;
                }
            }

            report.queue.reverse();
            info!(
                queued = report.queue.len(),
                scanned = report.commits_scanned,
                "Built propagation queue"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Pushes work for `commit` onto `stack` and reports how its affected
    /// repositories stand.
    async fn scan_commit(
        &self,
        source: &Path,
        commit: &CommitInfo,
        stack: &mut Vec<Todo>,
    ) -> Result<CommitTally, ScanError> {
        let paths: Vec<String> = self
            .git
            .changed_files(source, &commit.hash)
            .await?
            .iter()
            .map(|path| rooted(path))
            .collect();

        let affected = self.store.find_repos_affected_by_file_changes(&paths).await?;
        debug!(
            commit = %commit.hash,
            files = paths.len(),
            affected = affected.len(),
            "Examined commit"
        );

        let mut tally = CommitTally {
            affected: affected.len(),
            up_to_date: 0,
        };
        for name in &affected {
            let repo = match name.parse::<RepoName>() {
                Ok(repo) => repo,
                Err(e) => {
                    warn!(repo = %name, error = %e, "Ignoring stored repository");
                    continue;
                }
            };

            match self.store.is_unchanged_commit(name, &commit.hash).await {
                Ok(true) => {
                    debug!(repo = %repo, commit = %commit.hash, "Recorded as unchanged");
                    tally.up_to_date += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(repo = %repo, commit = %commit.hash, error = %e, "Existence check failed");
                    continue;
                }
            }

            match self.dedup.already_propagated(&repo, &commit.hash).await {
                Ok(true) => tally.up_to_date += 1,
                Ok(false) => stack.push(Todo::new(repo, commit.hash.clone())),
                Err(e) => {
                    warn!(repo = %repo, commit = %commit.hash, error = %e, "Existence check failed");
                }
            }
        }

        Ok(tally)
    }
}

/// Propagates each queued item in order.
///
/// Items are independent: one failing never stops the others.
pub async fn apply_queue(
    propagator: &Propagator<'_>,
    source: &Path,
    queue: &[Todo],
) -> RunSummary {
    let mut summary = RunSummary::new(false);
    summary.queued = queue.len();

    for (i, todo) in queue.iter().enumerate() {
        info!(item = i + 1, total = queue.len(), todo = %todo, "Applying queued item");
        let result = propagator.propagate(source, todo).await;
        summary.record_result(&result);
    }

    summary
}
