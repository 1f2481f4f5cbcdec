//! The sweep pipeline.
//!
//! Wires the stages together in order: rate-limit snapshot, inventory
//! collection, classification, retention selection, execution, summary.
//! Every entity lives for exactly one invocation.

use crate::classify::classify;
use crate::config::SweepConfig;
use crate::executor::DeletionExecutor;
use crate::github::WorkflowHost;
use crate::inventory;
use crate::ratelimit::{RateLimitTracker, SweepPhase};
use crate::report::SweepSummary;
use crate::retention::build_plan;
use crate::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

/// Runs one sweep invocation end to end.
pub struct SweepService {
    host: Arc<dyn WorkflowHost>,
    config: SweepConfig,
}

impl SweepService {
    /// Creates a service over a host capability and a validated-or-not
    /// configuration (validation happens in [`run`](Self::run) before any
    /// API call).
    #[must_use]
    pub fn new(host: Arc<dyn WorkflowHost>, config: SweepConfig) -> Self {
        Self { host, config }
    }

    /// Executes the sweep and returns the structured summary.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidConfig` before any API call for conflicting policy
    ///   options.
    /// - `Error::ApiFailed` / `Error::BudgetExhausted` if the inventory
    ///   fetch fails (fatal: a partial inventory cannot drive retention).
    /// - `Error::InsufficientBudget` when a real delete batch is refused.
    ///
    /// Per-run delete failures do not fail the invocation; they appear as
    /// `failed` outcomes in the summary.
    #[instrument(
        name = "runsweep.sweep",
        skip(self),
        fields(repo = %self.config.repo, dry_run = self.config.dry_run)
    )]
    pub async fn run(&self) -> Result<SweepSummary> {
        // Policy conflicts must surface before the first request.
        let policy = self.config.policy()?;

        let tracker = RateLimitTracker::new(Arc::clone(&self.host));
        let start_snapshot = tracker.snapshot(SweepPhase::Inventory).await?;

        let inventory = inventory::collect(self.host.as_ref(), &self.config.repo).await?;
        let classified = classify(&inventory.definitions, inventory.runs);
        info!(
            total = classified.orphan_count() + classified.active_count(),
            orphan = classified.orphan_count(),
            active = classified.active_count(),
            workflows = classified.groups.len(),
            "Classified inventory"
        );

        let plan = build_plan(&classified, policy, Utc::now());
        info!(eligible = plan.eligible_count(), "Deletion plan built");

        let executor = DeletionExecutor::new(Arc::clone(&self.host), self.config.executor.clone());
        let report = executor
            .execute(&self.config.repo, &plan, self.config.dry_run, &tracker)
            .await?;

        let summary = SweepSummary::assemble(
            &self.config.repo,
            policy,
            &classified,
            &plan,
            report,
            start_snapshot,
        );

        if let Some(ref path) = self.config.artifact_path {
            summary.write_artifact(path)?;
        }

        Ok(summary)
    }
}
