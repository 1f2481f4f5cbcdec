//! Run inventory collection.
//!
//! Drives the host capability page by page until both list endpoints are
//! exhausted and merges everything eagerly into an in-memory catalog.
//! Classification needs the complete snapshot, so there is nothing to gain
//! from streaming: a partial inventory must never drive retention decisions
//! (under-counting active runs would misclassify runs as orphan), which is
//! why any failure mid-pagination is fatal for the invocation.

use crate::github::WorkflowHost;
use crate::models::{RepoRef, WorkflowDefinition, WorkflowRun};
use crate::{Error, Result};
use tracing::{debug, info, instrument};

/// Complete catalog of a repository's workflow state at collection time.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    /// All workflow definitions currently configured.
    pub definitions: Vec<WorkflowDefinition>,
    /// All workflow runs, in API order (newest first).
    pub runs: Vec<WorkflowRun>,
}

impl Inventory {
    /// Total number of runs in the catalog.
    #[must_use]
    pub const fn total_runs(&self) -> usize {
        self.runs.len()
    }
}

/// Collects the full inventory for a repository.
///
/// Tolerates an empty repository (zero workflows, zero runs) by returning
/// empty collections. Budget consumption is proportional to page count;
/// exhaustion reported by the API surfaces as the distinguishable
/// [`Error::BudgetExhausted`] so callers can stop immediately.
///
/// # Errors
///
/// Any API failure during pagination is returned as-is; the caller must
/// treat it as fatal for the invocation.
#[instrument(name = "runsweep.inventory.collect", skip_all, fields(repo = %repo))]
pub async fn collect(host: &dyn WorkflowHost, repo: &RepoRef) -> Result<Inventory> {
    let definitions = collect_pages(host, repo, "workflows", |page| {
        host.workflows_page(repo, page)
    })
    .await?;
    let runs = collect_pages(host, repo, "runs", |page| host.runs_page(repo, page)).await?;

    info!(
        workflows = definitions.len(),
        runs = runs.len(),
        "Inventory collected"
    );

    Ok(Inventory { definitions, runs })
}

/// Drains one paginated list endpoint into a vector.
async fn collect_pages<T, F, Fut>(
    host: &dyn WorkflowHost,
    repo: &RepoRef,
    endpoint: &str,
    mut fetch: F,
) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<crate::github::Page<T>>>,
{
    let page_size = host.page_size().max(1);
    let mut items = Vec::new();
    let mut page = 1u32;

    loop {
        let batch = fetch(page).await.map_err(|e| {
            if matches!(e, Error::BudgetExhausted { .. }) {
                tracing::error!(
                    repo = %repo,
                    endpoint,
                    page,
                    "Budget exhausted mid-pagination, aborting inventory"
                );
            }
            e
        })?;

        metrics::counter!("sweep_inventory_pages_total", "endpoint" => endpoint.to_string())
            .increment(1);
        debug!(
            endpoint,
            page,
            fetched = batch.items.len(),
            total = batch.total_count,
            "Fetched inventory page"
        );

        let exhausted = batch.items.len() < page_size;
        items.extend(batch.items);
        if exhausted || u64::try_from(items.len()).unwrap_or(u64::MAX) >= batch.total_count {
            break;
        }
        page += 1;
    }

    Ok(items)
}
