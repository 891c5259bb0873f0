//! Turns one [`Todo`] into a pull request.
//!
//! ```text
//! stored config ─► clone destination ─► read copy rules ─► checkout source
//!      ─► copy_dirs ─► commit + Source-Link ─► final existence check
//!      ─► push ─► open pull request ─► record config (compare-and-swap)
//! ```
//!
//! The existence check right before pushing is mandatory. Another run may have
//! opened a pull request for the same commit since the queue was built; in
//! that case nothing is pushed and the item ends as a collision.

mod error;

pub use error::PropagateError;

use crate::config::{load_repo_files, RepoFiles};
use crate::context::Context;
use crate::copy::copy_dirs;
use crate::dedup::DedupChecker;
use crate::git::clone_to_temp;
use crate::host::{NewPullRequest, RepoName};
use crate::issues::report_config_defect;
use crate::scanner::Todo;
use crate::store::{ExpectedVersion, RepoConfig, WriteOutcome};
use crate::summary::ProcessingResult;
use crate::templates::{generate_propagation_branch, PropagationPrData};
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span, warn, Instrument};

/// Name of the commit message trailer linking back to the source commit.
pub const SOURCE_LINK_TRAILER: &str = "Source-Link";

/// Appends the `Source-Link` trailer to a commit message.
#[must_use]
pub fn with_source_link(message: &str, link: &str) -> String {
    format!("{}\n\n{SOURCE_LINK_TRAILER}: {link}\n", message.trim_end())
}

/// Splits a commit message into its subject line and the rest.
#[must_use]
pub fn split_message(message: &str) -> (&str, &str) {
    match message.split_once('\n') {
        Some((subject, body)) => (subject.trim(), body.trim()),
        None => (message.trim(), ""),
    }
}

/// Propagates source commits into destination repositories.
pub struct Propagator<'a> {
    ctx: Context<'a>,
    dedup: &'a DedupChecker<'a>,
    source_repo: RepoName,
}

impl<'a> Propagator<'a> {
    /// Creates a propagator for commits of `source_repo`.
    pub fn new(ctx: Context<'a>, dedup: &'a DedupChecker<'a>, source_repo: RepoName) -> Self {
        Self {
            ctx,
            dedup,
            source_repo,
        }
    }

    /// Propagates `todo` using the source checkout at `source`.
    ///
    /// Never fails: errors are reported as [`ProcessingResult::Failed`].
    pub async fn propagate(&self, source: &Path, todo: &Todo) -> ProcessingResult {
        let span = info_span!("propagate", repo = %todo.repo, commit = %todo.source_commit_hash);

        async {
            match self.try_propagate(source, todo).await {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "Propagation failed");
                    ProcessingResult::Failed {
                        repository: todo.repo.full_name(),
                        error: e.to_string(),
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn try_propagate(
        &self,
        source: &Path,
        todo: &Todo,
    ) -> Result<ProcessingResult, PropagateError> {
        let ctx = self.ctx;
        let repo = &todo.repo;
        let repository = repo.full_name();
        let hash = &todo.source_commit_hash;

        let Some(stored) = ctx.store.get_config(&repository).await? else {
            warn!("No stored configuration");
            return Ok(skipped(repo, "no stored configuration"));
        };

        let dest = clone_to_temp(
            ctx.git,
            &ctx.remote.clone_url(repo)?,
            Some(1),
            Some(&stored.branch_name),
        )
        .await?;
        let dest_head = ctx.git.head(dest.path()).await?;

        let files = match load_repo_files(dest.path()) {
            Ok(files) => files,
            Err(defect) => {
                report_config_defect(ctx.host, ctx.renderer, repo, &defect).await?;
                return Ok(skipped(repo, &format!("configuration defect: {defect}")));
            }
        };

        ctx.git.checkout(source, hash).await?;
        let commit = ctx
            .git
            .log(source, hash, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PropagateError::MissingCommit(hash.clone()))?;

        let report = copy_dirs(source, dest.path(), &files.copy_config.copy_dirs)?;
        info!(
            files = report.files,
            removed = report.removed.len(),
            "Copied generated code"
        );

        if !ctx.git.has_changes(dest.path()).await? {
            info!(reason = "no changes", "Destination already matches source, recording commit");
            ctx.store.record_unchanged_commit(&repository, hash).await?;
            return Ok(skipped(repo, "no changes"));
        }

        let source_link = ctx.remote.commit_url(&self.source_repo, hash)?;
        let branch = generate_propagation_branch(hash);
        ctx.git.create_branch(dest.path(), &branch).await?;
        ctx.git
            .commit_all(
                dest.path(),
                &with_source_link(&commit.message, source_link.as_str()),
            )
            .await?;

        if self.dedup.already_propagated(repo, hash).await? {
            warn!("Propagated concurrently, abandoning");
            return Ok(ProcessingResult::Collision {
                repository,
                reason: format!("{hash} was propagated by another run"),
            });
        }

        ctx.git
            .push(dest.path(), &ctx.remote.clone_url(repo)?, &branch)
            .await?;

        let removed = relative_to(dest.path(), &report.removed);
        let (subject, body) = split_message(&commit.message);
        let pr_body = ctx.renderer.render_propagation_pr(&PropagationPrData {
            body,
            source_link: source_link.as_str(),
            source_repo: &self.source_repo.full_name(),
            source_commit: hash,
            removed: &removed,
        })?;
        let created = ctx
            .host
            .create_pull_request(
                repo,
                &NewPullRequest {
                    title: subject.to_string(),
                    head: branch,
                    base: stored.branch_name.clone(),
                    body: pr_body,
                },
            )
            .await?;
        info!(pr_number = created.number, url = %created.url, "Opened pull request");

        self.record_config(&repository, &stored, files, dest_head)
            .await?;

        Ok(ProcessingResult::Propagated {
            repository,
            number: created.number,
            url: created.url,
        })
    }

    /// Records the declarative files read at `dest_head`, unless another
    /// writer replaced the stored record in the meantime.
    async fn record_config(
        &self,
        repository: &str,
        stored: &RepoConfig,
        files: RepoFiles,
        dest_head: String,
    ) -> Result<(), PropagateError> {
        if stored.commit_hash == dest_head {
            return Ok(());
        }

        let updated = RepoConfig {
            copy_rules: files.copy_config.copy_dirs,
            post_processor_image: files.copy_config.docker.map(|docker| docker.image),
            lock: files.lock,
            commit_hash: dest_head,
            branch_name: stored.branch_name.clone(),
            installation_id: stored.installation_id,
        };
        let outcome = self
            .ctx
            .store
            .store_config(repository, updated, &ExpectedVersion::of(Some(stored)))
            .await?;
        if outcome == WriteOutcome::Conflict {
            warn!("Stored configuration changed concurrently, keeping the newer record");
        }
        Ok(())
    }
}

fn skipped(repo: &RepoName, reason: &str) -> ProcessingResult {
    ProcessingResult::Skipped {
        repository: repo.full_name(),
        reason: reason.to_string(),
    }
}

/// Expresses removed paths relative to the destination checkout.
fn relative_to(root: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .map(|path| path.strip_prefix(root).unwrap_or(path).to_path_buf())
        .collect()
}
