//! Sweep summary assembly and artifact output.
//!
//! The structured record external automation branches on: counts,
//! classifications, the deletion plan, per-run outcomes, and the budget
//! estimate. Obtainable in memory from [`crate::SweepService`] and
//! persistable as pretty-printed JSON so a scheduler can decide whether to
//! re-run with `dry_run=false`.

use crate::executor::{BudgetEstimate, ExecutionReport};
use crate::classify::ClassifiedRuns;
use crate::models::{DeletionOutcome, RateLimitSnapshot, RepoRef, RetentionPolicy, RunId};
use crate::retention::DeletionPlan;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Active run count for one workflow, in classifier encounter order.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowCount {
    /// Workflow name.
    pub workflow: String,
    /// Number of active runs.
    pub runs: usize,
}

/// Eligible run ids for one plan group.
///
/// `workflow: null` marks the orphan group.
#[derive(Debug, Clone, Serialize)]
pub struct EligibleGroup {
    /// Workflow name, or `None` for orphans.
    pub workflow: Option<String>,
    /// Eligible run ids in deletion order.
    pub run_ids: Vec<RunId>,
}

/// The complete, machine-readable record of one sweep invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    /// Repository slug (`owner/name`).
    pub repository: String,
    /// Whether this invocation was a dry run.
    pub dry_run: bool,
    /// Echo of the `min_runs` option.
    pub min_runs: Option<u32>,
    /// Echo of the `max_days` option.
    pub max_days: Option<u32>,
    /// Total runs in the inventory.
    pub total_runs: usize,
    /// Orphan run count.
    pub orphan_runs: usize,
    /// Active run count.
    pub active_runs: usize,
    /// Per-workflow active counts, in encounter order.
    pub active_by_workflow: Vec<WorkflowCount>,
    /// Eligible-for-deletion set, grouped (orphan group included).
    pub eligible: Vec<EligibleGroup>,
    /// Total eligible runs.
    pub eligible_count: usize,
    /// Per-run outcomes in plan order.
    pub outcomes: Vec<DeletionOutcome>,
    /// Budget remaining when the sweep started.
    pub rate_limit_remaining: u64,
    /// When the budget resets (UTC).
    pub rate_limit_reset_at: DateTime<Utc>,
    /// Batch cost estimate and sufficiency verdict.
    pub estimate: BudgetEstimate,
    /// When the summary was assembled (UTC).
    pub completed_at: DateTime<Utc>,
}

impl SweepSummary {
    /// Assembles the summary from the pipeline's intermediate products.
    #[must_use]
    pub fn assemble(
        repo: &RepoRef,
        policy: Option<RetentionPolicy>,
        classified: &ClassifiedRuns,
        plan: &DeletionPlan,
        report: ExecutionReport,
        start_snapshot: RateLimitSnapshot,
    ) -> Self {
        let active_by_workflow = classified
            .groups
            .iter()
            .map(|g| WorkflowCount {
                workflow: g.workflow.clone(),
                runs: g.runs.len(),
            })
            .collect();

        let eligible: Vec<EligibleGroup> = plan
            .groups
            .iter()
            .map(|g| EligibleGroup {
                workflow: g.workflow.clone(),
                run_ids: g.runs.iter().map(|r| r.id).collect(),
            })
            .collect();

        Self {
            repository: repo.slug(),
            dry_run: report.dry_run,
            min_runs: policy.and_then(|p| p.min_runs()),
            max_days: policy.and_then(|p| p.max_days()),
            total_runs: classified.orphan_count() + classified.active_count(),
            orphan_runs: classified.orphan_count(),
            active_runs: classified.active_count(),
            active_by_workflow,
            eligible,
            eligible_count: plan.eligible_count(),
            outcomes: report.outcomes,
            rate_limit_remaining: start_snapshot.remaining,
            rate_limit_reset_at: start_snapshot.reset_at,
            estimate: report.estimate,
            completed_at: Utc::now(),
        }
    }

    /// Serializes the summary as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Artifact {
            cause: e.to_string(),
        })
    }

    /// Writes the summary artifact to a file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Artifact` if serialization or the write fails.
    pub fn write_artifact(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| Error::Artifact {
            cause: format!("{}: {e}", path.display()),
        })?;
        tracing::info!(path = %path.display(), "Summary artifact written");
        Ok(())
    }

    /// Returns a short human-readable digest.
    #[must_use]
    pub fn digest(&self) -> String {
        let action = if self.dry_run {
            "would delete"
        } else {
            "deleted"
        };
        let deleted = self
            .outcomes
            .iter()
            .filter(|o| o.status.is_deleted())
            .count();
        let failed = self
            .outcomes
            .iter()
            .filter(|o| o.status.is_failed())
            .count();

        if self.dry_run {
            format!(
                "{action} {} of {} runs ({} orphan, {} active); estimate {} of {} remaining",
                self.eligible_count,
                self.total_runs,
                self.orphan_runs,
                self.active_runs,
                self.estimate.estimated_cost,
                self.rate_limit_remaining,
            )
        } else {
            format!(
                "{action} {deleted} of {} eligible runs ({failed} failed)",
                self.eligible_count,
            )
        }
    }
}
