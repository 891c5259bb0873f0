//! [`CodeHost`] implementation for GitHub.

use super::rate_limit::{ensure_rate_limit, ApiResource};
use super::{
    build_search_query, Artifact, CodeHost, CreatedArtifact, HostError, NewPullRequest, RepoName,
};
use async_trait::async_trait;
use octocrab::models::IssueState;
use octocrab::params::{self, Direction};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, Instrument};

/// Query parameters for the search endpoints.
#[derive(Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    per_page: u8,
}

/// Paging for list endpoints that take raw query parameters.
#[derive(Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
}

/// Response of `GET /installation/repositories`.
#[derive(Deserialize)]
struct InstallationRepositories {
    total_count: u64,
    repositories: Vec<octocrab::models::Repository>,
}

/// Results per page when listing installation repositories.
const REPOSITORIES_PER_PAGE: u8 = 100;

/// The only part of a search response existence checks need.
#[derive(Deserialize)]
struct SearchTotal {
    total_count: u64,
}

/// GitHub REST API client.
#[derive(Clone)]
pub struct GitHubHost {
    octocrab: Octocrab,
}

impl GitHubHost {
    /// Wraps an authenticated octocrab client.
    #[must_use]
    pub fn new(octocrab: Octocrab) -> Self {
        Self { octocrab }
    }

    /// Builds a client authenticated with a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn from_token(token: impl Into<String>) -> Result<Self, HostError> {
        let octocrab = Octocrab::builder().personal_token(token.into()).build()?;
        Ok(Self::new(octocrab))
    }
}

#[async_trait]
impl CodeHost for GitHubHost {
    async fn list_repositories(&self) -> Result<Vec<RepoName>, HostError> {
        let span = info_span!("list_repositories");
        async {
            let mut repos = Vec::new();
            let mut seen = 0u64;
            for page in 1.. {
                ensure_rate_limit(&self.octocrab, ApiResource::Core).await?;
                let result: InstallationRepositories = self
                    .octocrab
                    .get(
                        "/installation/repositories",
                        Some(&PageParams {
                            per_page: REPOSITORIES_PER_PAGE,
                            page,
                        }),
                    )
                    .await?;

                let received = result.repositories.len();
                seen += received as u64;
                repos.extend(
                    result
                        .repositories
                        .into_iter()
                        .filter(|repo| !repo.archived.unwrap_or(false))
                        .filter_map(|repo| Some(RepoName::new(repo.owner?.login, repo.name))),
                );

                if received < usize::from(REPOSITORIES_PER_PAGE) || seen >= result.total_count {
                    break;
                }
            }

            repos.sort();
            info!(count = repos.len(), "Listed installation repositories");
            Ok(repos)
        }
        .instrument(span)
        .await
    }

    async fn search_commits(&self, repo: &RepoName, text: &str) -> Result<u64, HostError> {
        let query = build_search_query(repo, text);
        debug!(query = %query, "Searching commits");

        ensure_rate_limit(&self.octocrab, ApiResource::Search).await?;
        let result: SearchTotal = self
            .octocrab
            .get(
                "/search/commits",
                Some(&SearchParams {
                    q: &query,
                    per_page: 1,
                }),
            )
            .await?;
        Ok(result.total_count)
    }

    async fn search_issues_and_pull_requests(
        &self,
        repo: &RepoName,
        text: &str,
    ) -> Result<u64, HostError> {
        let query = build_search_query(repo, text);
        debug!(query = %query, "Searching issues and pull requests");

        ensure_rate_limit(&self.octocrab, ApiResource::Search).await?;
        let page = self
            .octocrab
            .search()
            .issues_and_pull_requests(&query)
            .per_page(1)
            .send()
            .await?;
        Ok(page.total_count.unwrap_or(page.items.len() as u64))
    }

    async fn recent_pull_requests(
        &self,
        repo: &RepoName,
        limit: u8,
    ) -> Result<Vec<Artifact>, HostError> {
        ensure_rate_limit(&self.octocrab, ApiResource::Core).await?;
        let page = self
            .octocrab
            .pulls(&repo.owner, &repo.name)
            .list()
            .state(params::State::All)
            .sort(params::pulls::Sort::Created)
            .direction(Direction::Descending)
            .per_page(limit)
            .send()
            .await?;

        Ok(page
            .items
            .into_iter()
            .map(|pr| Artifact {
                number: pr.number,
                title: pr.title.unwrap_or_default(),
                body: pr.body.unwrap_or_default(),
            })
            .collect())
    }

    async fn recent_issues(&self, repo: &RepoName, limit: u8) -> Result<Vec<Artifact>, HostError> {
        ensure_rate_limit(&self.octocrab, ApiResource::Core).await?;
        let page = self
            .octocrab
            .issues(&repo.owner, &repo.name)
            .list()
            .state(params::State::All)
            .sort(params::issues::Sort::Created)
            .direction(Direction::Descending)
            .per_page(limit)
            .send()
            .await?;

        Ok(page
            .items
            .into_iter()
            .map(|issue| Artifact {
                number: issue.number,
                title: issue.title,
                body: issue.body.unwrap_or_default(),
            })
            .collect())
    }

    async fn find_open_issue(
        &self,
        repo: &RepoName,
        title: &str,
    ) -> Result<Option<u64>, HostError> {
        debug!(title = %title, "Checking for duplicate issue");

        // Search for open issues with exact title match
        let query = format!(
            "repo:{} is:issue is:open in:title \"{}\"",
            repo.full_name(),
            title
        );

        ensure_rate_limit(&self.octocrab, ApiResource::Search).await?;
        let results = self
            .octocrab
            .search()
            .issues_and_pull_requests(&query)
            .send()
            .await?;

        Ok(results
            .items
            .iter()
            .find(|issue| issue.title == title)
            .map(|issue| issue.number))
    }

    async fn create_issue(
        &self,
        repo: &RepoName,
        title: &str,
        body: &str,
    ) -> Result<CreatedArtifact, HostError> {
        let span = info_span!("create_issue", repo = %repo);
        async {
            ensure_rate_limit(&self.octocrab, ApiResource::Core).await?;
            let issue = self
                .octocrab
                .issues(&repo.owner, &repo.name)
                .create(title)
                .body(body)
                .send()
                .await?;

            info!(issue_number = issue.number, "Issue created");
            Ok(CreatedArtifact {
                number: issue.number,
                url: issue.html_url.to_string(),
            })
        }
        .instrument(span)
        .await
    }

    async fn create_pull_request(
        &self,
        repo: &RepoName,
        request: &NewPullRequest,
    ) -> Result<CreatedArtifact, HostError> {
        let span = info_span!("create_pull_request", repo = %repo, head = %request.head);
        async {
            ensure_rate_limit(&self.octocrab, ApiResource::Core).await?;
            let pr = self
                .octocrab
                .pulls(&repo.owner, &repo.name)
                .create(&request.title, &request.head, &request.base)
                .body(&request.body)
                .send()
                .await
                .map_err(|e| {
                    // GitHub answers 422 "A pull request already exists for ..."
                    if e.to_string().to_lowercase().contains("already exists") {
                        HostError::PullRequestExists {
                            repo: repo.full_name(),
                            head: request.head.clone(),
                        }
                    } else {
                        HostError::from(e)
                    }
                })?;

            let url = pr
                .html_url
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_else(|| format!("https://github.com/{}/pull/{}", repo, pr.number));

            info!(pr_number = pr.number, "Pull request created");
            Ok(CreatedArtifact {
                number: pr.number,
                url,
            })
        }
        .instrument(span)
        .await
    }

    async fn find_open_pull_request(
        &self,
        repo: &RepoName,
        head: &str,
    ) -> Result<Option<CreatedArtifact>, HostError> {
        ensure_rate_limit(&self.octocrab, ApiResource::Core).await?;
        let page = self
            .octocrab
            .pulls(&repo.owner, &repo.name)
            .list()
            .state(params::State::Open)
            .head(format!("{}:{}", repo.owner, head))
            .per_page(1)
            .send()
            .await?;

        Ok(page.items.into_iter().next().map(|pr| CreatedArtifact {
            number: pr.number,
            url: pr
                .html_url
                .map(|u| u.to_string())
                .unwrap_or_else(|| format!("https://github.com/{}/pull/{}", repo, pr.number)),
        }))
    }

    async fn close_pull_request(&self, repo: &RepoName, number: u64) -> Result<(), HostError> {
        ensure_rate_limit(&self.octocrab, ApiResource::Core).await?;
        self.octocrab
            .issues(&repo.owner, &repo.name)
            .update(number)
            .state(IssueState::Closed)
            .send()
            .await?;

        info!(repo = %repo, pr_number = number, "Pull request closed");
        Ok(())
    }
}
