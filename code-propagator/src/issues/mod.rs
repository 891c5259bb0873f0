//! Issues filed on destination repositories.
//!
//! A repository whose declarative files are defective is skipped by every
//! run until fixed. The defect is reported once through an issue; later runs
//! find the open issue by its exact title and leave it alone.

mod defect_issue;
mod error;
mod status;

pub use defect_issue::DefectIssue;
pub use error::IssueError;
pub use status::IssueStatus;

use crate::config::ConfigError;
use crate::host::{CodeHost, RepoName};
use crate::templates::{TemplateRenderer, DEFECT_ISSUE_TITLE};
use tracing::{info, info_span, warn, Instrument};

/// Reports a configuration defect on `repository`.
///
/// This function:
/// 1. Checks for an open issue with the defect title
/// 2. Renders the issue body
/// 3. Creates the issue
///
/// # Errors
///
/// Returns [`IssueError`] if the lookup, rendering or creation fails (except
/// for permission denied, which returns a [`Skipped`][`IssueStatus::Skipped`]
/// status).
pub async fn report_config_defect(
    host: &dyn CodeHost,
    renderer: &TemplateRenderer,
    repository: &RepoName,
    defect: &ConfigError,
) -> Result<DefectIssue, IssueError> {
    let span = info_span!("report_config_defect", repo = %repository);

    async {
        warn!(error = %defect, "Configuration defect");
        let title = DEFECT_ISSUE_TITLE.to_string();

        if let Some(number) = host.find_open_issue(repository, &title).await? {
            info!(issue_number = number, "Defect issue already open, skipping");
            return Ok(DefectIssue {
                repository: repository.clone(),
                title,
                status: IssueStatus::Existing { number },
            });
        }

        let body = renderer.render_defect_issue(defect)?;

        match host.create_issue(repository, &title, &body).await {
            Ok(created) => {
                info!(issue_number = created.number, "Defect issue created");
                Ok(DefectIssue {
                    repository: repository.clone(),
                    title,
                    status: IssueStatus::Created {
                        number: created.number,
                        url: created.url,
                    },
                })
            }
            Err(e) if e.is_permission_denied() => {
                warn!("Permission denied, not filing defect issue");
                Ok(DefectIssue {
                    repository: repository.clone(),
                    title,
                    status: IssueStatus::Skipped {
                        reason: "no write access".to_string(),
                    },
                })
            }
            Err(e) => Err(e.into()),
        }
    }
    .instrument(span)
    .await
}
