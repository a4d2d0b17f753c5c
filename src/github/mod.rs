//! GitHub REST API v3 client: repository metadata, pull requests via the
//! issue search endpoint, and per-PR detail fetches for diff counters.

pub mod payload;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::model::{self, PullRequest, Repository, User};
use payload::{PullDetailPayload, RepositoryPayload, SearchIssuesPayload};

const BASE_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "repo-analyzer";
const SEARCH_PAGE_SIZE: u32 = 30;
/// Pause between per-PR detail fetches to stay clear of secondary rate
/// limits.
const DETAIL_FETCH_PACING: Duration = Duration::from_millis(500);
/// Upper bound on how long a 403 rate-limit response makes us wait.
const MAX_RATE_LIMIT_WAIT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),
}

/// Thin wrapper over `reqwest::Client` carrying the optional API token.
/// Unauthenticated use works but hits much lower rate limits.
pub struct GitHubClient {
    http: reqwest::Client,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(config: &Config) -> Self {
        GitHubClient {
            http: reqwest::Client::new(),
            token: config.github_token(),
        }
    }

    #[instrument(skip(self), fields(owner = %owner, name = %name))]
    pub async fn get_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Repository, GitHubError> {
        let url = format!("{}/repos/{}/{}", BASE_URL, owner, name);
        let payload: RepositoryPayload = self.get_json(&url, &[]).await?;
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        Ok(payload.into_repository(today))
    }

    /// First page of the repository's pull requests via the search API,
    /// each enriched with diff counters from the detail endpoint. A
    /// failed detail fetch degrades that PR's counters to zero instead of
    /// failing the listing.
    #[instrument(skip(self), fields(owner = %owner, name = %name))]
    pub async fn list_pull_requests(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Vec<PullRequest>, GitHubError> {
        let url = format!("{}/search/issues", BASE_URL);
        let query = format!("is:pr repo:{}/{}", owner, name);
        let per_page = SEARCH_PAGE_SIZE.to_string();
        let search: SearchIssuesPayload = self
            .get_json(&url, &[("q", query.as_str()), ("per_page", per_page.as_str())])
            .await?;
        debug!(items = search.items.len(), "search returned pull requests");

        let mut prs = Vec::with_capacity(search.items.len());
        for item in search.items {
            let details = self.pull_request_details(owner, name, item.number).await;
            prs.push(item.into_pull_request(details));
            tokio::time::sleep(DETAIL_FETCH_PACING).await;
        }
        Ok(prs)
    }

    async fn pull_request_details(
        &self,
        owner: &str,
        name: &str,
        number: u64,
    ) -> Option<PullDetailPayload> {
        let url = format!("{}/repos/{}/{}/pulls/{}", BASE_URL, owner, name, number);
        match self.get_json(&url, &[]).await {
            Ok(details) => Some(details),
            Err(err) => {
                warn!(number, error = %err, "failed to fetch pull request details");
                None
            }
        }
    }

    /// GET with standard headers, decoding JSON. A 403 carrying an
    /// `X-RateLimit-Reset` header sleeps until the window resets (capped)
    /// and retries; any other failure status surfaces as an error.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GitHubError> {
        loop {
            let mut request = self
                .http
                .get(url)
                .header("User-Agent", USER_AGENT)
                .header("Accept", "application/vnd.github.v3+json")
                .query(query);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            let response = request.send().await?;

            if response.status() == StatusCode::FORBIDDEN {
                if let Some(wait) = rate_limit_wait(&response) {
                    warn!(seconds = wait.as_secs(), "rate limited, waiting");
                    tokio::time::sleep(wait).await;
                    continue;
                }
            }

            return Ok(response.error_for_status()?.json::<T>().await?);
        }
    }
}

/// Seconds until the rate-limit window resets, from `X-RateLimit-Reset`
/// (a unix timestamp), capped at [`MAX_RATE_LIMIT_WAIT_SECS`]. None when
/// the header is missing or already in the past.
fn rate_limit_wait(response: &reqwest::Response) -> Option<Duration> {
    let reset: u64 = response
        .headers()
        .get("X-RateLimit-Reset")?
        .to_str()
        .ok()?
        .parse()
        .ok()?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_secs();
    if reset <= now {
        return None;
    }
    Some(Duration::from_secs(
        (reset - now + 1).min(MAX_RATE_LIMIT_WAIT_SECS),
    ))
}

/// Everything one collection run produces for a repository.
pub struct Collected {
    pub repository: Repository,
    pub pull_requests: Vec<PullRequest>,
    /// Distinct PR authors with their PR counts, ready for profile
    /// scraping and the user table merge.
    pub users: Vec<User>,
}

/// Fetch the repository, its pull requests, and the distinct authors.
pub async fn collect(
    client: &GitHubClient,
    owner: &str,
    name: &str,
) -> Result<Collected, GitHubError> {
    let mut repository = client.get_repository(owner, name).await?;
    let pull_requests = client.list_pull_requests(owner, name).await?;
    let users = model::pull_request_authors(&pull_requests);
    repository.pull_requests = pull_requests.clone();

    Ok(Collected {
        repository,
        pull_requests,
        users,
    })
}
