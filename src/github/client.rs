//! GitHub REST client.

use super::{DEFAULT_PAGE_SIZE, Page, WorkflowHost};
use crate::models::{RateLimitSnapshot, RepoRef, RunId, WorkflowDefinition, WorkflowId, WorkflowRun};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

/// HTTP timeouts for API requests.
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    /// Overall request timeout in milliseconds (0 disables).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 disables).
    pub connect_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 5_000,
        }
    }
}

/// Builds the underlying HTTP client from a timeout config.
fn build_http_client(config: HttpConfig) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build GitHub HTTP client: {err}");
        reqwest::Client::new()
    })
}

/// GitHub REST API client implementing [`WorkflowHost`].
pub struct GithubClient {
    /// API endpoint.
    endpoint: String,
    /// Authentication token.
    token: SecretString,
    /// Items per page for list endpoints.
    page_size: usize,
    /// HTTP client.
    client: reqwest::Client,
}

impl GithubClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.github.com";

    /// Creates a new client for the given token.
    #[must_use]
    pub fn new(token: SecretString) -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            token,
            page_size: DEFAULT_PAGE_SIZE,
            client: build_http_client(HttpConfig::default()),
        }
    }

    /// Sets the API endpoint (GitHub Enterprise, test servers).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the page size for list endpoints.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, DEFAULT_PAGE_SIZE);
        self
    }

    /// Sets HTTP timeouts.
    #[must_use]
    pub fn with_http_config(mut self, config: HttpConfig) -> Self {
        self.client = build_http_client(config);
        self
    }

    /// Issues a GET request and decodes the JSON body.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        url: String,
    ) -> Result<T> {
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", concat!("runsweep/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(|e| send_error(operation, &e))?;

        let response = check_status(operation, response).await?;

        response.json::<T>().await.map_err(|e| {
            tracing::error!(operation, error = %e, "Failed to decode API response");
            Error::ApiFailed {
                operation: operation.to_string(),
                cause: format!("undecodable response: {e}"),
            }
        })
    }
}

#[async_trait]
impl WorkflowHost for GithubClient {
    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn workflows_page(&self, repo: &RepoRef, page: u32) -> Result<Page<WorkflowDefinition>> {
        let url = format!(
            "{}/repos/{}/{}/actions/workflows?per_page={}&page={page}",
            self.endpoint, repo.owner, repo.name, self.page_size
        );
        let body: WorkflowListWire = self.get_json("list_workflows", url).await?;

        Ok(Page {
            items: body.workflows.into_iter().map(Into::into).collect(),
            total_count: body.total_count,
        })
    }

    async fn runs_page(&self, repo: &RepoRef, page: u32) -> Result<Page<WorkflowRun>> {
        let url = format!(
            "{}/repos/{}/{}/actions/runs?per_page={}&page={page}",
            self.endpoint, repo.owner, repo.name, self.page_size
        );
        let body: RunListWire = self.get_json("list_runs", url).await?;

        Ok(Page {
            items: body.workflow_runs.into_iter().map(Into::into).collect(),
            total_count: body.total_count,
        })
    }

    async fn delete_run(&self, repo: &RepoRef, run: RunId) -> Result<()> {
        let url = format!(
            "{}/repos/{}/{}/actions/runs/{run}",
            self.endpoint, repo.owner, repo.name
        );
        let response = self
            .client
            .delete(&url)
            .bearer_auth(self.token.expose_secret())
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", concat!("runsweep/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(|e| send_error("delete_run", &e))?;

        check_status("delete_run", response).await?;
        Ok(())
    }

    async fn rate_limit(&self) -> Result<RateLimitSnapshot> {
        let url = format!("{}/rate_limit", self.endpoint);
        let body: RateLimitWire = self.get_json("rate_limit", url).await?;

        Ok(RateLimitSnapshot {
            remaining: body.resources.core.remaining,
            reset_at: epoch_to_utc(body.resources.core.reset),
        })
    }
}

/// Maps a transport-level error, logging the failure kind.
fn send_error(operation: &str, e: &reqwest::Error) -> Error {
    let error_kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_request() {
        "request"
    } else {
        "unknown"
    };
    tracing::error!(
        operation,
        error = %e,
        error_kind,
        "API request failed"
    );
    Error::ApiFailed {
        operation: operation.to_string(),
        cause: format!("{error_kind} error: {e}"),
    }
}

/// Rejects non-success statuses, distinguishing an exhausted budget.
///
/// A 403/429 with `x-ratelimit-remaining: 0` means the core budget is spent;
/// everything else is a plain API failure.
async fn check_status(operation: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let remaining = header_u64(&response, "x-ratelimit-remaining");
    let reset = header_u64(&response, "x-ratelimit-reset");
    if (status == reqwest::StatusCode::FORBIDDEN
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS)
        && remaining == Some(0)
    {
        let reset_at = epoch_to_utc(reset.unwrap_or_default());
        tracing::error!(operation, %status, %reset_at, "Rate limit budget exhausted");
        return Err(Error::BudgetExhausted { reset_at });
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!(operation, %status, body = %body, "API returned error status");
    Err(Error::ApiFailed {
        operation: operation.to_string(),
        cause: format!("API returned status: {status} - {body}"),
    })
}

/// Reads a numeric response header, if present and parseable.
fn header_u64(response: &reqwest::Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Converts an epoch-seconds value to UTC, clamping the unrepresentable.
fn epoch_to_utc(secs: u64) -> DateTime<Utc> {
    let secs = i64::try_from(secs).unwrap_or(i64::MAX);
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

/// Rate limit response.
#[derive(Debug, Deserialize)]
struct RateLimitWire {
    resources: RateLimitResourcesWire,
}

/// Per-resource rate limit buckets.
#[derive(Debug, Deserialize)]
struct RateLimitResourcesWire {
    core: RateLimitCoreWire,
}

/// The core resource bucket, the one deletes draw from.
#[derive(Debug, Deserialize)]
struct RateLimitCoreWire {
    remaining: u64,
    reset: u64,
}

/// Workflow list response.
#[derive(Debug, Deserialize)]
struct WorkflowListWire {
    total_count: u64,
    workflows: Vec<WorkflowWire>,
}

/// A workflow definition on the wire.
#[derive(Debug, Deserialize)]
struct WorkflowWire {
    id: u64,
    name: String,
    path: String,
    state: String,
}

impl From<WorkflowWire> for WorkflowDefinition {
    fn from(wire: WorkflowWire) -> Self {
        Self {
            id: WorkflowId(wire.id),
            name: wire.name,
            path: wire.path,
            state: wire.state,
        }
    }
}

/// Run list response.
#[derive(Debug, Deserialize)]
struct RunListWire {
    total_count: u64,
    workflow_runs: Vec<RunWire>,
}

/// A workflow run on the wire.
#[derive(Debug, Deserialize)]
struct RunWire {
    id: u64,
    workflow_id: u64,
    name: String,
    created_at: DateTime<Utc>,
    html_url: String,
}

impl From<RunWire> for WorkflowRun {
    fn from(wire: RunWire) -> Self {
        Self {
            id: RunId(wire.id),
            workflow_id: WorkflowId(wire.workflow_id),
            name: wire.name,
            created_at: wire.created_at,
            html_url: wire.html_url,
        }
    }
}
