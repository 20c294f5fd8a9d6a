use std::fmt;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::header::ACCEPT;
use reqwest::header::USER_AGENT;
use reqwest::Response;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use tracing::instrument;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT_VALUE: &str = concat!("forgebot/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const RUNS_PER_PAGE: usize = 100;

// -----------------------------------------------------------------------------
// GithubOps trait

/// Operations against the hosted repository.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GithubOps: Send + Sync {
    /// Open a pull request merging `head` into `base`.
    async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequest, GithubError>;

    /// Resolve a PR to its head commit and list every workflow run for that
    /// commit. Empty when CI has not started yet.
    async fn workflow_runs_for_pr(&self, pr_number: u64) -> Result<Vec<WorkflowRun>, GithubError>;
}

// -----------------------------------------------------------------------------
// Types

/// Client to interact with the GitHub REST API.
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
    /// `owner/name`
    repository: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub name: Option<String>,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("GitHub token is not configured (set GITHUB_TOKEN)")]
    MissingToken,
    #[error("GitHub repository is not configured (set GITHUB_REPO to owner/name)")]
    MissingRepository,
    #[error("invalid GitHub repository `{0}`, expected owner/name")]
    InvalidRepository(String),
    #[error("GitHub authentication failed: {0}")]
    AuthFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("GitHub rate limit exceeded")]
    RateLimited,
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
}

#[derive(Debug, Serialize)]
struct CreatePullRequest<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

#[derive(Debug, Deserialize)]
struct PullRequestHead {
    head: CommitRef,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct WorkflowRunsPage {
    total_count: usize,
    workflow_runs: Vec<ApiWorkflowRun>,
}

#[derive(Debug, Deserialize)]
struct ApiWorkflowRun {
    id: u64,
    name: Option<String>,
    status: Option<String>,
    conclusion: Option<String>,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
    field: Option<String>,
    code: Option<String>,
}

impl From<ApiWorkflowRun> for WorkflowRun {
    fn from(run: ApiWorkflowRun) -> Self {
        Self {
            id: run.id,
            name: run.name,
            status: run.status,
            conclusion: run.conclusion,
            url: run.html_url,
        }
    }
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        let details: Vec<String> = self
            .errors
            .iter()
            .filter_map(|detail| match (&detail.message, &detail.field, &detail.code) {
                (Some(message), _, _) => Some(message.clone()),
                (None, Some(field), Some(code)) => Some(format!("{}: {}", field, code)),
                (None, None, Some(code)) => Some(code.clone()),
                _ => None,
            })
            .collect();
        if !details.is_empty() {
            write!(f, " ({})", details.join("; "))?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// GithubClient impl

impl fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubClient")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("repository", &self.repository)
            .finish()
    }
}

impl GithubClient {
    /// Missing values are only reported when an API call is made.
    pub fn new(token: Option<String>, repository: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
            token,
            repository,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    fn token(&self) -> Result<&str, GithubError> {
        self.token.as_deref().ok_or(GithubError::MissingToken)
    }

    fn repo_url(&self, path: &str) -> Result<String, GithubError> {
        let repository = self
            .repository
            .as_deref()
            .ok_or(GithubError::MissingRepository)?;
        match repository.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(format!("{}/repos/{}/{}/{}", self.api_url, owner, name, path))
            }
            _ => Err(GithubError::InvalidRepository(repository.to_string())),
        }
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: &str,
    ) -> Result<reqwest::RequestBuilder, GithubError> {
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(self.token()?)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header("X-GitHub-Api-Version", API_VERSION))
    }

    async fn send<T: DeserializeOwned>(builder: reqwest::RequestBuilder) -> Result<T, GithubError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GithubError::Network(e.to_string()))?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, GithubError> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| GithubError::Api {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            });
        }

        let quota_exhausted = response
            .headers()
            .get("x-ratelimit-remaining")
            .is_some_and(|remaining| remaining == "0");
        let message = match response.json::<ApiErrorBody>().await {
            Ok(body) => body.to_string(),
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };
        debug!(status = status.as_u16(), %message, "GitHub API request failed");

        Err(match status {
            StatusCode::UNAUTHORIZED => GithubError::AuthFailed(message),
            StatusCode::FORBIDDEN if quota_exhausted => GithubError::RateLimited,
            StatusCode::FORBIDDEN => GithubError::AuthFailed(format!("permission denied: {}", message)),
            StatusCode::NOT_FOUND => GithubError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => GithubError::RateLimited,
            _ => GithubError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Head commit SHA of a pull request.
    #[instrument(skip(self))]
    pub async fn pull_request_head_sha(&self, pr_number: u64) -> Result<String, GithubError> {
        let url = self.repo_url(&format!("pulls/{}", pr_number))?;
        let pr: PullRequestHead = Self::send(self.request(reqwest::Method::GET, &url)?).await?;
        Ok(pr.head.sha)
    }

    /// All workflow runs whose head commit is `head_sha`, following pagination.
    #[instrument(skip(self))]
    pub async fn list_workflow_runs(&self, head_sha: &str) -> Result<Vec<WorkflowRun>, GithubError> {
        let url = self.repo_url("actions/runs")?;
        let mut runs = Vec::new();
        for page in 1.. {
            let query = [
                ("head_sha", head_sha.to_string()),
                ("per_page", RUNS_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let builder = self.request(reqwest::Method::GET, &url)?.query(&query);
            let batch: WorkflowRunsPage = Self::send(builder).await?;

            let fetched = batch.workflow_runs.len();
            runs.extend(batch.workflow_runs.into_iter().map(WorkflowRun::from));
            if fetched < RUNS_PER_PAGE || runs.len() >= batch.total_count {
                break;
            }
        }
        debug!(count = runs.len(), "Listed workflow runs");
        Ok(runs)
    }
}

#[async_trait]
impl GithubOps for GithubClient {
    #[instrument(skip(self, body))]
    async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequest, GithubError> {
        let url = self.repo_url("pulls")?;
        let request_body = CreatePullRequest {
            title,
            body,
            head,
            base,
        };
        let builder = self.request(reqwest::Method::POST, &url)?.json(&request_body);
        Self::send(builder).await
    }

    async fn workflow_runs_for_pr(&self, pr_number: u64) -> Result<Vec<WorkflowRun>, GithubError> {
        let head_sha = self.pull_request_head_sha(pr_number).await?;
        self.list_workflow_runs(&head_sha).await
    }
}
