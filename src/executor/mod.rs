//! Deletion execution.
//!
//! Runs the eligible-for-deletion set either as a dry-run report or as a
//! real delete batch over a small fixed-size worker pool. The defaults
//! (one worker, half a second of pause after every completed delete) are a
//! deliberate response to the platform's secondary rate limit on rapid
//! write bursts. Both knobs are configurable, but the conservative values
//! are the point, not an accident of tuning.

use crate::models::{DeletionOutcome, OutcomeStatus, RateLimitSnapshot, RepoRef, WorkflowRun};
use crate::ratelimit::{RateLimitTracker, SweepPhase};
use crate::retention::DeletionPlan;
use crate::{Error, Result};
use crate::github::WorkflowHost;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Configuration for the deletion executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Number of delete workers.
    ///
    /// Default: 1 (conservative for the platform's secondary rate limits).
    pub workers: usize,

    /// Pause inserted after each completed delete, regardless of worker
    /// count.
    ///
    /// Default: 500 ms.
    pub post_delete_delay: Duration,

    /// Request-budget cost of one delete.
    ///
    /// The platform does not document this constant, so it stays pluggable.
    /// Default: 1.
    pub cost_per_delete: u64,

    /// Fraction of the remaining budget the batch may use.
    ///
    /// Default: 1.0 (the whole remaining budget counts). Lower it to leave
    /// headroom for whatever else shares the token.
    pub budget_headroom: f64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            post_delete_delay: Duration::from_millis(500),
            cost_per_delete: 1,
            budget_headroom: 1.0,
        }
    }
}

impl ExecutorConfig {
    /// Creates an executor configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `RUNSWEEP_WORKERS` | Delete worker count | 1 |
    /// | `RUNSWEEP_DELETE_DELAY_MS` | Post-delete pause | 500 |
    /// | `RUNSWEEP_DELETE_COST` | Budget cost per delete | 1 |
    /// | `RUNSWEEP_BUDGET_HEADROOM` | Usable budget fraction | 1.0 |
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("RUNSWEEP_WORKERS") {
            if let Ok(parsed) = v.parse::<usize>() {
                self.workers = parsed.max(1);
            }
        }
        if let Ok(v) = std::env::var("RUNSWEEP_DELETE_DELAY_MS") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.post_delete_delay = Duration::from_millis(parsed);
            }
        }
        if let Ok(v) = std::env::var("RUNSWEEP_DELETE_COST") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.cost_per_delete = parsed.max(1);
            }
        }
        if let Ok(v) = std::env::var("RUNSWEEP_BUDGET_HEADROOM") {
            if let Ok(parsed) = v.parse::<f64>() {
                self.budget_headroom = parsed.clamp(0.0, 1.0);
            }
        }
        self
    }

    /// Sets the worker count.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the post-delete pause.
    #[must_use]
    pub const fn with_post_delete_delay(mut self, delay: Duration) -> Self {
        self.post_delete_delay = delay;
        self
    }

    /// Sets the per-delete budget cost.
    #[must_use]
    pub const fn with_cost_per_delete(mut self, cost: u64) -> Self {
        self.cost_per_delete = cost;
        self
    }

    /// Sets the usable budget fraction.
    #[must_use]
    pub fn with_budget_headroom(mut self, headroom: f64) -> Self {
        self.budget_headroom = headroom.clamp(0.0, 1.0);
        self
    }
}

/// Pre-flight comparison of batch cost against the remaining budget.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BudgetEstimate {
    /// Number of eligible runs.
    pub eligible: usize,
    /// Configured cost of one delete.
    pub cost_per_delete: u64,
    /// Total estimated request cost.
    pub estimated_cost: u64,
    /// Remaining budget at check time.
    pub remaining: u64,
    /// Remaining budget after the headroom fraction is applied.
    pub usable_remaining: u64,
    /// Whether the batch fits in the usable budget.
    pub sufficient: bool,
}

impl BudgetEstimate {
    /// Computes the estimate for a batch of `eligible` deletes.
    #[must_use]
    pub fn compute(eligible: usize, config: &ExecutorConfig, snapshot: RateLimitSnapshot) -> Self {
        let estimated_cost =
            u64::try_from(eligible).unwrap_or(u64::MAX).saturating_mul(config.cost_per_delete);
        let usable_remaining = usable_budget(snapshot.remaining, config.budget_headroom);
        Self {
            eligible,
            cost_per_delete: config.cost_per_delete,
            estimated_cost,
            remaining: snapshot.remaining,
            usable_remaining,
            sufficient: estimated_cost <= usable_remaining,
        }
    }
}

/// Applies the headroom fraction to a remaining budget.
fn usable_budget(remaining: u64, headroom: f64) -> u64 {
    if headroom >= 1.0 {
        return remaining;
    }
    let scaled = (remaining as f64) * headroom.clamp(0.0, 1.0);
    if scaled >= u64::MAX as f64 {
        u64::MAX
    } else {
        scaled as u64
    }
}

/// Result of executing a deletion plan.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// One outcome per eligible run, in plan order.
    pub outcomes: Vec<DeletionOutcome>,
    /// The pre-flight budget estimate.
    pub estimate: BudgetEstimate,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Wall-clock duration of the batch in milliseconds.
    pub duration_ms: u64,
}

impl ExecutionReport {
    /// Number of runs actually deleted.
    #[must_use]
    pub fn deleted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_deleted()).count()
    }

    /// Number of per-run failures.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_failed()).count()
    }
}

/// Executes deletion plans against a host.
pub struct DeletionExecutor {
    host: Arc<dyn WorkflowHost>,
    config: ExecutorConfig,
}

impl DeletionExecutor {
    /// Creates an executor over the given host.
    #[must_use]
    pub fn new(host: Arc<dyn WorkflowHost>, config: ExecutorConfig) -> Self {
        Self { host, config }
    }

    /// Executes a deletion plan.
    ///
    /// Dry-run produces one skipped outcome per eligible run and performs
    /// zero delete requests; the budget estimate is computed in both modes.
    /// A real batch is refused outright when the estimate exceeds the
    /// usable remaining budget; it never starts and fails partway.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientBudget`] for the pre-flight refusal and
    /// propagates rate-limit query failures. Per-run delete failures do NOT
    /// error; they become `Failed` outcomes.
    #[instrument(
        name = "runsweep.executor.execute",
        skip_all,
        fields(eligible = plan.eligible_count(), dry_run)
    )]
    pub async fn execute(
        &self,
        repo: &RepoRef,
        plan: &DeletionPlan,
        dry_run: bool,
        tracker: &RateLimitTracker,
    ) -> Result<ExecutionReport> {
        let start = Instant::now();
        let runs: Vec<WorkflowRun> = plan.iter_runs().cloned().collect();

        let snapshot = tracker.snapshot(SweepPhase::Deletion).await?;
        let estimate = BudgetEstimate::compute(runs.len(), &self.config, snapshot);

        if dry_run {
            let outcomes = runs
                .iter()
                .map(|run| DeletionOutcome::now(run.id, OutcomeStatus::SkippedDryRun))
                .collect();
            info!(
                eligible = estimate.eligible,
                estimated_cost = estimate.estimated_cost,
                remaining = estimate.remaining,
                sufficient = estimate.sufficient,
                "Dry run complete"
            );
            return Ok(ExecutionReport {
                outcomes,
                estimate,
                dry_run: true,
                duration_ms: duration_to_millis(start.elapsed()),
            });
        }

        if !estimate.sufficient {
            return Err(Error::InsufficientBudget {
                required: estimate.estimated_cost,
                remaining: estimate.usable_remaining,
            });
        }

        let outcomes = self.delete_batch(repo, runs).await?;
        let duration_ms = duration_to_millis(start.elapsed());

        metrics::histogram!("sweep_delete_batch_duration_ms").record(u64_to_f64(duration_ms));
        info!(
            deleted = outcomes.iter().filter(|o| o.status.is_deleted()).count(),
            failed = outcomes.iter().filter(|o| o.status.is_failed()).count(),
            duration_ms,
            "Delete batch complete"
        );

        Ok(ExecutionReport {
            outcomes,
            estimate,
            dry_run: false,
            duration_ms,
        })
    }

    /// Drains the eligible set through the worker pool.
    ///
    /// Work is partitioned by a shared pop-front queue, so no run ever
    /// reaches two workers. Each worker accumulates outcomes privately;
    /// the buffers are merged and re-ordered to plan order after the pool
    /// drains.
    async fn delete_batch(
        &self,
        repo: &RepoRef,
        runs: Vec<WorkflowRun>,
    ) -> Result<Vec<DeletionOutcome>> {
        let queue: Arc<Mutex<VecDeque<(usize, WorkflowRun)>>> =
            Arc::new(Mutex::new(runs.into_iter().enumerate().collect()));
        let workers = self.config.workers.max(1);
        let delay = self.config.post_delete_delay;

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let host = Arc::clone(&self.host);
            let repo = repo.clone();
            let queue = Arc::clone(&queue);

            handles.push(tokio::spawn(async move {
                let mut outcomes: Vec<(usize, DeletionOutcome)> = Vec::new();
                loop {
                    let next = {
                        let mut queue =
                            queue.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                        queue.pop_front()
                    };
                    let Some((index, run)) = next else { break };

                    let status = match host.delete_run(&repo, run.id).await {
                        Ok(()) => {
                            metrics::counter!("sweep_runs_deleted_total").increment(1);
                            tracing::debug!(run_id = %run.id, url = %run.html_url, "Deleted workflow run");
                            OutcomeStatus::Deleted
                        },
                        Err(e) => {
                            metrics::counter!("sweep_runs_delete_failed_total").increment(1);
                            warn!(run_id = %run.id, error = %e, "Failed to delete workflow run");
                            OutcomeStatus::Failed(e.to_string())
                        },
                    };
                    outcomes.push((index, DeletionOutcome::now(run.id, status)));

                    // Keep the aggregate write rate bounded even with more
                    // than one worker.
                    tokio::time::sleep(delay).await;
                }
                outcomes
            }));
        }

        let mut merged: Vec<(usize, DeletionOutcome)> = Vec::new();
        for handle in handles {
            let buffer = handle.await.map_err(|e| Error::ApiFailed {
                operation: "delete_worker".to_string(),
                cause: e.to_string(),
            })?;
            merged.extend(buffer);
        }

        merged.sort_by_key(|(index, _)| *index);
        Ok(merged.into_iter().map(|(_, outcome)| outcome).collect())
    }
}

/// Safely converts Duration to milliseconds as u64, capping at `u64::MAX`.
#[inline]
fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Converts u64 to f64 for metrics, capping at `u32::MAX`.
#[inline]
fn u64_to_f64(value: u64) -> f64 {
    let capped = u32::try_from(value).unwrap_or(u32::MAX);
    f64::from(capped)
}
