//! Records a destination repository's declarative files in the config store.
//!
//! [`refresh_all`] creates the records of repositories the store has never
//! seen; [`refresh_repo_config`] re-reads a single one.

mod error;

pub use error::RefreshError;

use crate::config::load_repo_files;
use crate::context::Context;
use crate::git::clone_to_temp;
use crate::host::RepoName;
use crate::issues::{report_config_defect, IssueStatus};
use crate::store::{ExpectedVersion, RepoConfig, WriteOutcome};
use crate::summary::ProcessingResult;
use tracing::{error, info, info_span, warn, Instrument};

/// Result of [`refresh_repo_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new record was written.
    Recorded {
        /// Destination commit the files were read at.
        commit_hash: String,
    },

    /// The stored record was already read at the current commit.
    Unchanged,

    /// Another writer replaced the record first; nothing was written.
    Conflict,

    /// The declarative files are defective; the repository was skipped.
    Defect {
        /// What happened to the defect issue.
        issue: IssueStatus,
    },
}

impl RefreshOutcome {
    /// Converts the outcome into a per-repository result.
    #[must_use]
    pub fn into_result(self, repository: String) -> ProcessingResult {
        match self {
            Self::Recorded { commit_hash } => ProcessingResult::Refreshed {
                repository,
                commit_hash,
            },
            Self::Unchanged => ProcessingResult::Skipped {
                repository,
                reason: "configuration unchanged".to_string(),
            },
            Self::Conflict => ProcessingResult::Collision {
                repository,
                reason: "configuration refreshed concurrently".to_string(),
            },
            Self::Defect { issue } => ProcessingResult::Skipped {
                repository,
                reason: format!("configuration defect ({issue:?})"),
            },
        }
    }
}

/// Refreshes every repository the code host grants access to, except
/// `source_repo`.
///
/// Repositories are handled independently and in sorted order. One without
/// a copy-rule file gets a defect issue like any other defect.
///
/// # Errors
///
/// Returns [`RefreshError`] only if the repositories cannot be listed.
pub async fn refresh_all(
    ctx: Context<'_>,
    source_repo: &RepoName,
    installation_id: Option<u64>,
) -> Result<Vec<ProcessingResult>, RefreshError> {
    let span = info_span!("refresh_all", source = %source_repo);

    async {
        let repos = ctx.host.list_repositories().await?;
        info!(count = repos.len(), "Refreshing repositories");

        let mut results = Vec::with_capacity(repos.len());
        for repo in repos.iter().filter(|repo| *repo != source_repo) {
            let result = match refresh_repo_config(ctx, repo, installation_id).await {
                Ok(outcome) => outcome.into_result(repo.full_name()),
                Err(e) => {
                    error!(repo = %repo, error = %e, "Refresh failed");
                    ProcessingResult::Failed {
                        repository: repo.full_name(),
                        error: e.to_string(),
                    }
                }
            };
            results.push(result);
        }
        Ok(results)
    }
    .instrument(span)
    .await
}

/// Reads the declarative files of `repo` at the head of its branch and
/// records them.
///
/// The write is a compare-and-swap against the record read before cloning.
/// Without a stored record the repository's default branch is used. A given
/// `installation_id` replaces the recorded one.
///
/// # Errors
///
/// Returns [`RefreshError`] if cloning, the store or the code host fails.
/// Defective files are not an error.
pub async fn refresh_repo_config(
    ctx: Context<'_>,
    repo: &RepoName,
    installation_id: Option<u64>,
) -> Result<RefreshOutcome, RefreshError> {
    let span = info_span!("refresh_repo_config", repo = %repo);

    async {
        let repository = repo.full_name();
        let stored = ctx.store.get_config(&repository).await?;
        let expected = ExpectedVersion::of(stored.as_ref());

        let checkout = clone_to_temp(
            ctx.git,
            &ctx.remote.clone_url(repo)?,
            Some(1),
            stored.as_ref().map(|config| config.branch_name.as_str()),
        )
        .await?;
        let head = ctx.git.head(checkout.path()).await?;

        if stored.as_ref().is_some_and(|config| config.commit_hash == head) {
            info!(commit = %head, "Stored configuration is current");
            return Ok(RefreshOutcome::Unchanged);
        }

        let files = match load_repo_files(checkout.path()) {
            Ok(files) => files,
            Err(defect) => {
                let issue = report_config_defect(ctx.host, ctx.renderer, repo, &defect).await?;
                return Ok(RefreshOutcome::Defect {
                    issue: issue.status,
                });
            }
        };

        let branch_name = match &stored {
            Some(config) => config.branch_name.clone(),
            None => ctx.git.current_branch(checkout.path()).await?,
        };
        let config = RepoConfig {
            copy_rules: files.copy_config.copy_dirs,
            post_processor_image: files.copy_config.docker.map(|docker| docker.image),
            lock: files.lock,
            commit_hash: head.clone(),
            branch_name,
            installation_id: installation_id
                .or(stored.as_ref().map(|config| config.installation_id))
                .unwrap_or_default(),
        };

        match ctx.store.store_config(&repository, config, &expected).await? {
            WriteOutcome::Written => {
                info!(commit = %head, "Recorded configuration");
                Ok(RefreshOutcome::Recorded { commit_hash: head })
            }
            WriteOutcome::Conflict => {
                warn!("Configuration was refreshed concurrently");
                Ok(RefreshOutcome::Conflict)
            }
        }
    }
    .instrument(span)
    .await
}
