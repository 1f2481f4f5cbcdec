//! End-to-end pipeline tests against an in-memory host.
//!
//! Covers the acceptance scenarios: mixed orphan/active inventories under
//! both retention policies, dry-run accounting, real-delete outcome
//! bookkeeping, and configuration-error short-circuits.

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use runsweep::github::{Page, WorkflowHost};
use runsweep::{
    Error, ExecutorConfig, OutcomeStatus, RateLimitSnapshot, RepoRef, RunId, SweepConfig,
    SweepService, WorkflowDefinition, WorkflowId, WorkflowRun,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration as StdDuration;

/// In-memory workflow host over a fixed inventory.
struct MemoryHost {
    definitions: Vec<WorkflowDefinition>,
    runs: Vec<WorkflowRun>,
    remaining: u64,
    page_size: usize,
    list_calls: AtomicU32,
    delete_calls: AtomicU32,
    fail_delete_ids: HashSet<u64>,
}

impl MemoryHost {
    fn new(definitions: Vec<WorkflowDefinition>, runs: Vec<WorkflowRun>) -> Self {
        Self {
            definitions,
            runs,
            remaining: 5000,
            page_size: 100,
            list_calls: AtomicU32::new(0),
            delete_calls: AtomicU32::new(0),
            fail_delete_ids: HashSet::new(),
        }
    }

    fn with_remaining(mut self, remaining: u64) -> Self {
        self.remaining = remaining;
        self
    }

    fn page_of<T: Clone>(&self, items: &[T], page: u32) -> Page<T> {
        let start = (page as usize - 1) * self.page_size;
        let end = (start + self.page_size).min(items.len());
        let slice = if start >= items.len() {
            vec![]
        } else {
            items[start..end].to_vec()
        };
        Page {
            items: slice,
            total_count: items.len() as u64,
        }
    }
}

#[async_trait]
impl WorkflowHost for MemoryHost {
    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn workflows_page(
        &self,
        _repo: &RepoRef,
        page: u32,
    ) -> runsweep::Result<Page<WorkflowDefinition>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.page_of(&self.definitions, page))
    }

    async fn runs_page(&self, _repo: &RepoRef, page: u32) -> runsweep::Result<Page<WorkflowRun>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.page_of(&self.runs, page))
    }

    async fn delete_run(&self, _repo: &RepoRef, run: RunId) -> runsweep::Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete_ids.contains(&run.0) {
            return Err(Error::ApiFailed {
                operation: "delete_run".to_string(),
                cause: "API returned status: 502".to_string(),
            });
        }
        Ok(())
    }

    async fn rate_limit(&self) -> runsweep::Result<RateLimitSnapshot> {
        Ok(RateLimitSnapshot {
            remaining: self.remaining,
            reset_at: Utc::now(),
        })
    }
}

fn definition(id: u64, name: &str) -> WorkflowDefinition {
    WorkflowDefinition {
        id: WorkflowId(id),
        name: name.to_string(),
        path: format!(".github/workflows/{name}.yml"),
        state: "active".to_string(),
    }
}

fn run_aged(id: u64, workflow_id: u64, days_ago: i64) -> WorkflowRun {
    WorkflowRun {
        id: RunId(id),
        workflow_id: WorkflowId(workflow_id),
        name: format!("wf-{workflow_id}"),
        created_at: Utc::now() - Duration::days(days_ago),
        html_url: format!("https://example.test/runs/{id}"),
    }
}

fn fast_config(repo_host_config: SweepConfig) -> SweepConfig {
    repo_host_config.with_executor(
        ExecutorConfig::new().with_post_delete_delay(StdDuration::from_millis(0)),
    )
}

fn base_config() -> SweepConfig {
    fast_config(SweepConfig::new(RepoRef::new("octocat", "hello-world")))
}

/// Builds the 129-run acceptance inventory: 30 orphan runs plus 99 active
/// runs across 5 workflows with counts 19/20/19/21/20.
fn mixed_inventory() -> (Vec<WorkflowDefinition>, Vec<WorkflowRun>) {
    let counts = [19u64, 20, 19, 21, 20];
    let definitions: Vec<WorkflowDefinition> = (0..5)
        .map(|i| definition(i + 1, &format!("workflow-{}", i + 1)))
        .collect();

    let mut runs = Vec::new();
    let mut next_id = 1u64;

    // Orphans reference a workflow id with no definition.
    for _ in 0..30 {
        runs.push(run_aged(next_id, 999, 400));
        next_id += 1;
    }
    for (wf, &count) in counts.iter().enumerate() {
        for n in 0..count {
            runs.push(run_aged(next_id, wf as u64 + 1, n as i64));
            next_id += 1;
        }
    }

    (definitions, runs)
}

#[tokio::test]
async fn test_min_runs_scenario_129_runs() {
    let (definitions, runs) = mixed_inventory();
    let host = Arc::new(MemoryHost::new(definitions, runs));
    let service = SweepService::new(
        Arc::clone(&host) as Arc<dyn WorkflowHost>,
        base_config().with_min_runs(10),
    );

    let summary = service.run().await.unwrap();

    assert_eq!(summary.total_runs, 129);
    assert_eq!(summary.orphan_runs, 30);
    assert_eq!(summary.active_runs, 99);

    // 30 orphans + (19-10)+(20-10)+(19-10)+(21-10)+(20-10) = 79
    assert_eq!(summary.eligible_count, 79);
    assert_eq!(summary.estimate.estimated_cost, 79);
    assert_eq!(summary.outcomes.len(), 79);
    assert!(
        summary
            .outcomes
            .iter()
            .all(|o| o.status == OutcomeStatus::SkippedDryRun)
    );
    // Dry run never touches the delete endpoint
    assert_eq!(host.delete_calls.load(Ordering::SeqCst), 0);

    // Orphan group first, then the five workflows
    assert_eq!(summary.eligible.len(), 6);
    assert!(summary.eligible[0].workflow.is_none());
    assert_eq!(summary.eligible[0].run_ids.len(), 30);

    let group_sizes: Vec<usize> = summary.eligible[1..]
        .iter()
        .map(|g| g.run_ids.len())
        .collect();
    assert_eq!(group_sizes, vec![9, 10, 9, 11, 10]);
}

#[tokio::test]
async fn test_max_days_real_delete_scenario_32_runs() {
    // 32 active runs across 6 workflows, all older than the cutoff.
    let definitions: Vec<WorkflowDefinition> = (0..6)
        .map(|i| definition(i + 1, &format!("workflow-{}", i + 1)))
        .collect();
    let runs: Vec<WorkflowRun> = (0..32)
        .map(|i| run_aged(i + 1, (i % 6) + 1, 30 + i as i64))
        .collect();

    let host = Arc::new(MemoryHost::new(definitions, runs));
    let service = SweepService::new(
        Arc::clone(&host) as Arc<dyn WorkflowHost>,
        base_config().with_max_days(10).with_dry_run(false),
    );

    let summary = service.run().await.unwrap();

    assert_eq!(summary.total_runs, 32);
    assert_eq!(summary.orphan_runs, 0);
    assert_eq!(summary.eligible_count, 32);
    assert_eq!(summary.outcomes.len(), 32);
    assert!(summary.outcomes.iter().all(|o| o.status.is_deleted()));
    assert_eq!(host.delete_calls.load(Ordering::SeqCst), 32);
}

#[tokio::test]
async fn test_conflicting_options_make_zero_api_calls() {
    let (definitions, runs) = mixed_inventory();
    let host = Arc::new(MemoryHost::new(definitions, runs));
    let service = SweepService::new(
        Arc::clone(&host) as Arc<dyn WorkflowHost>,
        base_config().with_min_runs(10).with_max_days(10),
    );

    let result = service.run().await;
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
    assert_eq!(host.list_calls.load(Ordering::SeqCst), 0);
    assert_eq!(host.delete_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_partition_is_exact_in_summary() {
    let (definitions, runs) = mixed_inventory();
    let all_ids: HashSet<u64> = runs.iter().map(|r| r.id.0).collect();

    let host = Arc::new(MemoryHost::new(definitions, runs));
    let service = SweepService::new(
        Arc::clone(&host) as Arc<dyn WorkflowHost>,
        base_config().with_min_runs(1),
    );

    let summary = service.run().await.unwrap();
    assert_eq!(
        summary.orphan_runs + summary.active_runs,
        all_ids.len()
    );
    assert_eq!(summary.total_runs, all_ids.len());
}

#[tokio::test]
async fn test_per_run_failures_do_not_fail_the_sweep() {
    let definitions = vec![definition(1, "ci")];
    let runs: Vec<WorkflowRun> = (0..12).map(|i| run_aged(i + 1, 1, i as i64)).collect();

    let mut host = MemoryHost::new(definitions, runs);
    host.fail_delete_ids = [3u64, 7].into_iter().collect();
    let host = Arc::new(host);

    let service = SweepService::new(
        Arc::clone(&host) as Arc<dyn WorkflowHost>,
        base_config().with_min_runs(2).with_dry_run(false),
    );

    let summary = service.run().await.unwrap();

    assert_eq!(summary.eligible_count, 10);
    let deleted = summary.outcomes.iter().filter(|o| o.status.is_deleted()).count();
    let failed = summary.outcomes.iter().filter(|o| o.status.is_failed()).count();
    assert_eq!(deleted, 8);
    assert_eq!(failed, 2);
}

#[tokio::test]
async fn test_insufficient_budget_refuses_and_deletes_nothing() {
    let (definitions, runs) = mixed_inventory();
    let host = Arc::new(MemoryHost::new(definitions, runs).with_remaining(10));
    let service = SweepService::new(
        Arc::clone(&host) as Arc<dyn WorkflowHost>,
        base_config().with_min_runs(10).with_dry_run(false),
    );

    let result = service.run().await;
    assert!(matches!(
        result,
        Err(Error::InsufficientBudget {
            required: 79,
            remaining: 10
        })
    ));
    assert_eq!(host.delete_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_outcome_accounting_with_wider_pool() {
    let definitions = vec![definition(1, "ci")];
    let runs: Vec<WorkflowRun> = (0..40).map(|i| run_aged(i + 1, 1, i as i64)).collect();
    let expected: Vec<u64> = runs
        .iter()
        .map(|r| r.id.0)
        .filter(|&id| id > 5) // keep the 5 newest (ids 1..=5 are newest)
        .collect();

    let host = Arc::new(MemoryHost::new(definitions, runs));
    let config = base_config().with_min_runs(5).with_dry_run(false).with_executor(
        ExecutorConfig::new()
            .with_workers(4)
            .with_post_delete_delay(StdDuration::from_millis(0)),
    );
    let service = SweepService::new(Arc::clone(&host) as Arc<dyn WorkflowHost>, config);

    let summary = service.run().await.unwrap();

    // One outcome per eligible run, no duplicates, no omissions.
    assert_eq!(summary.outcomes.len(), 35);
    let seen: HashSet<u64> = summary.outcomes.iter().map(|o| o.run_id.0).collect();
    assert_eq!(seen, expected.into_iter().collect::<HashSet<u64>>());
}

#[tokio::test]
async fn test_orphan_only_sweep_without_policy() {
    let definitions = vec![definition(1, "ci")];
    let mut runs: Vec<WorkflowRun> = (0..5).map(|i| run_aged(i + 1, 1, i as i64)).collect();
    runs.push(run_aged(100, 42, 200));
    runs.push(run_aged(101, 42, 300));

    let host = Arc::new(MemoryHost::new(definitions, runs));
    let service = SweepService::new(
        Arc::clone(&host) as Arc<dyn WorkflowHost>,
        base_config(),
    );

    let summary = service.run().await.unwrap();

    // No policy: active runs untouched, orphans still eligible.
    assert_eq!(summary.orphan_runs, 2);
    assert_eq!(summary.eligible_count, 2);
    assert!(summary.eligible[0].workflow.is_none());
}
