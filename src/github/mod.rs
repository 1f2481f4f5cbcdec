//! GitHub API capability.
//!
//! The engine never talks HTTP directly; it goes through the [`WorkflowHost`]
//! trait, a narrow capability covering exactly what the sweep needs: list
//! workflow definitions, list workflow runs (both page by page), delete one
//! run, and report the current rate-limit counters. [`GithubClient`] is the
//! production implementation; tests substitute in-memory hosts.

mod client;

pub use client::{GithubClient, HttpConfig};

use crate::Result;
use crate::models::{RateLimitSnapshot, RepoRef, RunId, WorkflowDefinition, WorkflowRun};
use async_trait::async_trait;

/// Default page size for list endpoints (the API maximum).
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// One page of a list endpoint.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total item count for the whole query, as reported by the API.
    pub total_count: u64,
}

/// Capability for listing and deleting workflow runs on a hosting platform.
///
/// Pagination is driven by the caller: pages are numbered from 1 and a page
/// shorter than [`page_size`](WorkflowHost::page_size) ends the sequence.
#[async_trait]
pub trait WorkflowHost: Send + Sync {
    /// Page size the host serves for list endpoints.
    fn page_size(&self) -> usize {
        DEFAULT_PAGE_SIZE
    }

    /// Fetches one page of workflow definitions.
    async fn workflows_page(&self, repo: &RepoRef, page: u32) -> Result<Page<WorkflowDefinition>>;

    /// Fetches one page of workflow runs.
    async fn runs_page(&self, repo: &RepoRef, page: u32) -> Result<Page<WorkflowRun>>;

    /// Deletes a single workflow run.
    async fn delete_run(&self, repo: &RepoRef, run: RunId) -> Result<()>;

    /// Queries the current request budget.
    ///
    /// The rate-limit endpoint itself does not consume the core budget.
    async fn rate_limit(&self) -> Result<RateLimitSnapshot>;
}
