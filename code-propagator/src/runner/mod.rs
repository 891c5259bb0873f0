//! Orchestrates propagation runs.

mod config;
mod error;

pub use config::RunnerConfig;
pub use error::RunnerError;

use crate::config::load_copy_config;
use crate::context::Context;
use crate::copy::{copy_dirs, CopyReport};
use crate::dedup::DedupChecker;
use crate::git::{CommandGit, GitExecutor};
use crate::host::{CodeHost, GitHubHost, RemoteHost, RepoName};
use crate::lock_update::update_locks;
use crate::propagate::Propagator;
use crate::refresh::{refresh_all, refresh_repo_config, RefreshOutcome};
use crate::scanner::{apply_queue, CommitScanner, SourceCheckout, Todo};
use crate::settings::Settings;
use crate::store::{ConfigStore, FileConfigStore};
use crate::summary::{ProcessingResult, RunSummary};
use crate::templates::TemplateRenderer;
use std::path::Path;
use tracing::{info, info_span, warn, Instrument};

/// Owns the collaborators of a run and drives its operations.
pub struct Runner {
    settings: Settings,
    dry_run: bool,
    git: Box<dyn GitExecutor>,
    host: Box<dyn CodeHost>,
    store: Box<dyn ConfigStore>,
    remote: RemoteHost,
    renderer: TemplateRenderer,
}

impl Runner {
    /// Builds a runner talking to GitHub, the `git` binary and the file store.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the settings or the API client are invalid.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        let settings = config.settings().clone();
        let host = GitHubHost::from_token(config.token())?;
        let remote = RemoteHost::new(&settings.host_url, Some(config.token().to_string()))?;
        let store = FileConfigStore::new(settings.store_path.clone());

        Ok(Self::with_collaborators(
            settings,
            config.dry_run(),
            Box::new(CommandGit::default()),
            Box::new(host),
            Box::new(store),
            remote,
        ))
    }

    /// Builds a runner from explicit collaborators.
    pub fn with_collaborators(
        settings: Settings,
        dry_run: bool,
        git: Box<dyn GitExecutor>,
        host: Box<dyn CodeHost>,
        store: Box<dyn ConfigStore>,
        remote: RemoteHost,
    ) -> Self {
        Self {
            settings,
            dry_run,
            git,
            host,
            store,
            remote,
            renderer: TemplateRenderer::new(),
        }
    }

    fn context(&self) -> Context<'_> {
        Context {
            git: self.git.as_ref(),
            host: self.host.as_ref(),
            store: self.store.as_ref(),
            remote: &self.remote,
            renderer: &self.renderer,
        }
    }

    /// Scans source history and propagates every pending item.
    ///
    /// An empty store is first populated from every repository the code host
    /// lists. In dry-run mode the queue is printed instead of applied.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the source cannot be scanned. Failures of
    /// single items are counted in the summary instead.
    pub async fn scan(&self) -> Result<RunSummary, RunnerError> {
        let source_repo = self.settings.source_repo()?;
        let span = info_span!("scan", source = %source_repo);

        async {
            let ctx = self.context();
            let discovered = self.discover_if_empty(&source_repo).await?;
            let dedup = DedupChecker::new(ctx.host)
                .with_recent_limit(self.settings.recent_artifact_limit);
            let scanner = CommitScanner::new(ctx.git, ctx.store, &dedup)
                .with_early_stop(self.settings.early_stop());

            let source_url = ctx.remote.clone_url(&source_repo)?;
            let source =
                SourceCheckout::fetch(ctx.git, &source_url, self.settings.scan_depth).await?;
            let report = scanner
                .build_todo_queue(&source, self.settings.scan_depth)
                .await?;

            let mut summary = if self.dry_run {
                print_dry_run_preview(&report.queue);
                let mut summary = RunSummary::new(true);
                summary.queued = report.queue.len();
                summary
            } else {
                let propagator = Propagator::new(ctx, &dedup, source_repo.clone());
                apply_queue(&propagator, source.path(), &report.queue).await
            };
            summary.commits_scanned = report.commits_scanned;
            summary.stopped_early = report.stopped_early;
            for result in &discovered {
                summary.record_result(result);
            }

            info!(
                queued = summary.queued,
                propagated = summary.propagated,
                failed = summary.failed,
                "Scan finished"
            );
            Ok(summary)
        }
        .instrument(span)
        .await
    }

    /// Refreshes every repository the code host lists.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the repositories cannot be listed.
    pub async fn refresh_all(
        &self,
        installation_id: Option<u64>,
    ) -> Result<RunSummary, RunnerError> {
        let source_repo = self.settings.source_repo()?;
        let results = refresh_all(self.context(), &source_repo, installation_id).await?;
        Ok(summarize(&results))
    }

    /// Records every listed repository when the store holds none yet.
    async fn discover_if_empty(
        &self,
        source_repo: &RepoName,
    ) -> Result<Vec<ProcessingResult>, RunnerError> {
        if !self.store.list_configs().await?.is_empty() {
            return Ok(Vec::new());
        }
        if self.dry_run {
            warn!("Config store is empty; run `refresh --all` to record repositories");
            return Ok(Vec::new());
        }

        info!("Config store is empty, recording every listed repository");
        Ok(refresh_all(self.context(), source_repo, None).await?)
    }

    /// Refreshes the stored configuration of one repository.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the refresh fails.
    pub async fn refresh(
        &self,
        repo: &RepoName,
        installation_id: Option<u64>,
    ) -> Result<RefreshOutcome, RunnerError> {
        Ok(refresh_repo_config(self.context(), repo, installation_id).await?)
    }

    /// Opens lock-update pull requests for every repository using `image`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the affected repositories cannot be listed.
    pub async fn update_lock(&self, image: &str, digest: &str) -> Result<RunSummary, RunnerError> {
        let results = update_locks(self.context(), image, digest).await?;
        Ok(summarize(&results))
    }
}

fn summarize(results: &[ProcessingResult]) -> RunSummary {
    let mut summary = RunSummary::new(false);
    summary.queued = results.len();
    for result in results {
        summary.record_result(result);
    }
    summary
}

/// Applies the copy-rule file found in `config_root` from `source` onto
/// `dest`, without any remote.
///
/// # Errors
///
/// Returns [`RunnerError`] if the copy-rule file is defective or copying fails.
pub fn copy_local(source: &Path, dest: &Path, config_root: &Path) -> Result<CopyReport, RunnerError> {
    let rules = load_copy_config(config_root)?.copy_dirs;
    Ok(copy_dirs(source, dest, &rules)?)
}

fn print_dry_run_preview(queue: &[Todo]) {
    println!("\n[DRY RUN] {} item(s) pending, oldest first:\n", queue.len());
    for (i, todo) in queue.iter().enumerate() {
        println!(
            "  [{}/{}] {} <- {}",
            i + 1,
            queue.len(),
            todo.repo,
            todo.source_commit_hash
        );
    }
    println!();
}
