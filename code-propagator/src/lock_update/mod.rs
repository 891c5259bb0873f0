//! Opens pull requests moving repositories to a newly published
//! post-processor digest.
//!
//! At most one pull request exists per (repository, image, digest). The
//! store's first-recorder-wins bookkeeping settles races between concurrent
//! runs: a run that opened a pull request but lost the race closes it again.

mod error;

pub use error::LockUpdateError;

use crate::config::{write_lock_file, LockInfo};
use crate::context::Context;
use crate::git::clone_to_temp;
use crate::host::{NewPullRequest, RepoName};
use crate::store::RepoConfig;
use crate::summary::ProcessingResult;
use crate::templates::{generate_lock_branch, generate_lock_pr_title};
use tracing::{error, info, info_span, warn, Instrument};

/// Updates every repository using `image` to `digest`.
///
/// Each repository is handled independently; the returned results are in
/// repository order.
///
/// # Errors
///
/// Returns [`LockUpdateError`] only if the repositories using `image` cannot
/// be listed.
pub async fn update_locks(
    ctx: Context<'_>,
    image: &str,
    digest: &str,
) -> Result<Vec<ProcessingResult>, LockUpdateError> {
    let span = info_span!("update_locks", image, digest);

    async {
        let lock = LockInfo::new(image, digest);
        let repos = ctx.store.find_repos_with_post_processor(image).await?;
        info!(count = repos.len(), "Repositories using post-processor");

        let mut results = Vec::with_capacity(repos.len());
        for (repository, config) in &repos {
            let result = match update_lock(ctx, repository, config, &lock).await {
                Ok(result) => result,
                Err(e) => {
                    error!(repo = %repository, error = %e, "Lock update failed");
                    ProcessingResult::Failed {
                        repository: repository.clone(),
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

async fn update_lock(
    ctx: Context<'_>,
    repository: &str,
    config: &RepoConfig,
    lock: &LockInfo,
) -> Result<ProcessingResult, LockUpdateError> {
    let span = info_span!("update_lock", repo = %repository);

    async {
        let skipped = |reason: &str| ProcessingResult::Skipped {
            repository: repository.to_string(),
            reason: reason.to_string(),
        };

        if config.lock.as_ref() == Some(lock) {
            return Ok(skipped("already locked to digest"));
        }
        if let Some(existing) = ctx
            .store
            .find_pull_request_for_updating_lock(repository, lock)
            .await?
        {
            info!(pull_request = %existing, "Lock update already proposed");
            return Ok(skipped("lock update already proposed"));
        }

        let repo: RepoName = repository.parse()?;
        let clone_url = ctx.remote.clone_url(&repo)?;
        let checkout =
            clone_to_temp(ctx.git, &clone_url, Some(1), Some(&config.branch_name)).await?;

        write_lock_file(checkout.path(), lock)?;
        if !ctx.git.has_changes(checkout.path()).await? {
            return Ok(skipped("lock file already up to date"));
        }

        let branch = generate_lock_branch(lock);
        let title = generate_lock_pr_title(lock);
        ctx.git.create_branch(checkout.path(), &branch).await?;
        ctx.git.commit_all(checkout.path(), &title).await?;
        ctx.git.push(checkout.path(), &clone_url, &branch).await?;

        let body = ctx.renderer.render_lock_pr(lock, config.lock.as_ref())?;
        let request = NewPullRequest {
            title,
            head: branch,
            base: config.branch_name.clone(),
            body,
        };
        let created = match ctx.host.create_pull_request(&repo, &request).await {
            Ok(created) => created,
            Err(e) => {
                // Another run pushed the same branch and opened its pull request
                // first; that pull request now carries our commit too.
                let existing = ctx
                    .host
                    .find_open_pull_request(&repo, &request.head)
                    .await?;
                let Some(existing) = existing else {
                    return Err(e.into());
                };
                let winner = ctx
                    .store
                    .record_pull_request_for_updating_lock(
                        repository,
                        lock,
                        &existing.number.to_string(),
                    )
                    .await?;
                warn!(error = %e, winner = %winner, "Lock update branch already has a pull request");
                return Ok(ProcessingResult::Collision {
                    repository: repository.to_string(),
                    reason: format!("pull request #{winner} already proposes this lock"),
                });
            }
        };

        let ours = created.number.to_string();
        let winner = ctx
            .store
            .record_pull_request_for_updating_lock(repository, lock, &ours)
            .await?;
        if winner != ours {
            warn!(ours = %ours, winner = %winner, "Lost lock update race, closing pull request");
            ctx.host.close_pull_request(&repo, created.number).await?;
            return Ok(ProcessingResult::Collision {
                repository: repository.to_string(),
                reason: format!("pull request #{winner} already proposes this lock"),
            });
        }

        info!(pr_number = created.number, "Opened lock update pull request");
        Ok(ProcessingResult::Propagated {
            repository: repository.to_string(),
            number: created.number,
            url: created.url,
        })
    }
    .instrument(span)
    .await
}
