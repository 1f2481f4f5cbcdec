//! Retention selection.
//!
//! Computes which runs a retention policy makes eligible for deletion. Runs
//! are ordered by the total order `(created_at desc, run_id desc)`; the API
//! already serves newest-first, and duplicate timestamps from reusable
//! workflows are broken by run id. "Now" is captured once per invocation so
//! a long delete pass uses a single consistent cutoff.
//!
//! Orphan runs bypass per-workflow grouping entirely: with no live workflow
//! definition there is no "last N" to hold them against, so every orphan run
//! is eligible regardless of policy. Dead workflow history has no future
//! runs to compare against.

use crate::classify::ClassifiedRuns;
use crate::models::{RetentionPolicy, WorkflowRun};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// One group of eligible runs in the deletion plan.
#[derive(Debug, Clone)]
pub struct PlanGroup {
    /// Workflow name; `None` marks the orphan group.
    pub workflow: Option<String>,
    /// Eligible runs, oldest first (ascending run id on ties).
    pub runs: Vec<WorkflowRun>,
}

/// The complete set of runs eligible for deletion.
///
/// The orphan group (when non-empty) comes first, then active groups in
/// classifier encounter order. Groups with nothing eligible are omitted.
#[derive(Debug, Clone, Default)]
pub struct DeletionPlan {
    /// Cutoff used by an age-based policy, if one applied.
    pub cutoff: Option<DateTime<Utc>>,
    /// Eligible groups in deletion order.
    pub groups: Vec<PlanGroup>,
}

impl DeletionPlan {
    /// Total number of eligible runs.
    #[must_use]
    pub fn eligible_count(&self) -> usize {
        self.groups.iter().map(|g| g.runs.len()).sum()
    }

    /// Iterates eligible runs in deletion order.
    pub fn iter_runs(&self) -> impl Iterator<Item = &WorkflowRun> {
        self.groups.iter().flat_map(|g| g.runs.iter())
    }
}

/// Builds the deletion plan for a classified inventory.
///
/// `now` is the single per-invocation timestamp; age cutoffs derive from it
/// and are never re-evaluated per run.
#[must_use]
pub fn build_plan(
    classified: &ClassifiedRuns,
    policy: Option<RetentionPolicy>,
    now: DateTime<Utc>,
) -> DeletionPlan {
    let cutoff = match policy {
        Some(RetentionPolicy::MaxAgeDays(days)) => Some(now - Duration::days(i64::from(days))),
        _ => None,
    };

    let mut plan = DeletionPlan {
        cutoff,
        ..DeletionPlan::default()
    };

    if !classified.orphans.is_empty() {
        let mut orphans = classified.orphans.clone();
        sort_oldest_first(&mut orphans);
        debug!(eligible = orphans.len(), "Orphan runs are all eligible");
        plan.groups.push(PlanGroup {
            workflow: None,
            runs: orphans,
        });
    }

    let Some(policy) = policy else {
        return plan;
    };

    for group in &classified.groups {
        let eligible = select_eligible(&group.runs, policy, cutoff);
        if eligible.is_empty() {
            continue;
        }
        debug!(
            workflow = %group.workflow,
            total = group.runs.len(),
            eligible = eligible.len(),
            "Selected runs for deletion"
        );
        plan.groups.push(PlanGroup {
            workflow: Some(group.workflow.clone()),
            runs: eligible,
        });
    }

    plan
}

/// Selects the eligible subset of one workflow's runs.
fn select_eligible(
    runs: &[WorkflowRun],
    policy: RetentionPolicy,
    cutoff: Option<DateTime<Utc>>,
) -> Vec<WorkflowRun> {
    let mut eligible: Vec<WorkflowRun> = match policy {
        RetentionPolicy::KeepLastN(keep) => {
            let keep = usize::try_from(keep).unwrap_or(usize::MAX);
            if runs.len() <= keep {
                return Vec::new();
            }
            let mut ordered = runs.to_vec();
            sort_newest_first(&mut ordered);
            ordered.split_off(keep)
        },
        RetentionPolicy::MaxAgeDays(_) => {
            let Some(cutoff) = cutoff else {
                return Vec::new();
            };
            runs.iter()
                .filter(|run| run.created_at < cutoff)
                .cloned()
                .collect()
        },
    };

    sort_oldest_first(&mut eligible);
    eligible
}

/// Sorts by the total order, newest first.
fn sort_newest_first(runs: &mut [WorkflowRun]) {
    runs.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Sorts by the total order, oldest first (deletion order).
fn sort_oldest_first(runs: &mut [WorkflowRun]) {
    runs.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
