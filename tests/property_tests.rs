//! Property-based tests for classification and retention.
//!
//! Uses proptest to verify invariants across random inventories:
//! - Classification partitions the run set exactly
//! - Keep-last-N eligible counts follow the size arithmetic
//! - Max-age eligibility is monotonic in the age limit
//! - Orphans are always eligible regardless of policy

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use runsweep::classify::classify;
use runsweep::retention::build_plan;
use runsweep::{RetentionPolicy, RunId, WorkflowDefinition, WorkflowId, WorkflowRun};
use std::collections::HashSet;

/// Live workflow ids 1..=4; anything above is orphaned.
fn definitions() -> Vec<WorkflowDefinition> {
    (1..=4)
        .map(|id| WorkflowDefinition {
            id: WorkflowId(id),
            name: format!("workflow-{id}"),
            path: format!(".github/workflows/workflow-{id}.yml"),
            state: "active".to_string(),
        })
        .collect()
}

fn base_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single().unwrap()
}

/// Builds runs from `(workflow_id, age_hours)` pairs; run ids are the
/// element indexes, so they are unique by construction.
fn runs_from(pairs: &[(u64, u32)]) -> Vec<WorkflowRun> {
    let now = base_time();
    pairs
        .iter()
        .enumerate()
        .map(|(index, &(workflow_id, age_hours))| WorkflowRun {
            id: RunId(index as u64),
            workflow_id: WorkflowId(workflow_id),
            name: format!("wf-{workflow_id}"),
            created_at: now - Duration::hours(i64::from(age_hours)),
            html_url: format!("https://example.test/runs/{index}"),
        })
        .collect()
}

proptest! {
    /// Property: orphans and active groups partition the run set exactly.
    #[test]
    fn prop_classification_partitions_exactly(
        pairs in prop::collection::vec((1u64..8, 0u32..2000), 0..120)
    ) {
        let runs = runs_from(&pairs);
        let all_ids: HashSet<u64> = runs.iter().map(|r| r.id.0).collect();

        let classified = classify(&definitions(), runs);

        let mut seen: HashSet<u64> = HashSet::new();
        for run in &classified.orphans {
            prop_assert!(seen.insert(run.id.0), "run {} in two buckets", run.id);
        }
        for group in &classified.groups {
            for run in &group.runs {
                prop_assert!(seen.insert(run.id.0), "run {} in two buckets", run.id);
            }
        }
        prop_assert_eq!(seen, all_ids);
    }

    /// Property: keep-last-N eligible counts are exactly `max(M - K, 0)`
    /// per group, and the retained runs are the K newest.
    #[test]
    fn prop_keep_last_n_counts(
        pairs in prop::collection::vec((1u64..5, 0u32..2000), 0..100),
        keep in 1u32..20
    ) {
        let runs = runs_from(&pairs);
        let classified = classify(&definitions(), runs);
        let plan = build_plan(&classified, Some(RetentionPolicy::KeepLastN(keep)), base_time());

        let expected: usize = classified
            .groups
            .iter()
            .map(|g| g.runs.len().saturating_sub(keep as usize))
            .sum();
        prop_assert_eq!(plan.eligible_count(), expected);
    }

    /// Property: max-age eligibility is monotonic in the limit: a looser
    /// (larger) limit never makes more runs eligible.
    #[test]
    fn prop_max_age_monotonic(
        pairs in prop::collection::vec((1u64..5, 0u32..5000), 0..100),
        days_small in 1u32..60,
        extra in 1u32..60
    ) {
        let days_large = days_small + extra;
        let runs = runs_from(&pairs);
        let classified = classify(&definitions(), runs);
        let now = base_time();

        let small = build_plan(&classified, Some(RetentionPolicy::MaxAgeDays(days_small)), now);
        let large = build_plan(&classified, Some(RetentionPolicy::MaxAgeDays(days_large)), now);

        let small_ids: HashSet<u64> = small.iter_runs().map(|r| r.id.0).collect();
        let large_ids: HashSet<u64> = large.iter_runs().map(|r| r.id.0).collect();
        prop_assert!(large_ids.is_subset(&small_ids));
    }

    /// Property: every orphan run is eligible under every policy.
    #[test]
    fn prop_orphans_always_eligible(
        pairs in prop::collection::vec((1u64..8, 0u32..2000), 1..80),
        keep in 1u32..20
    ) {
        let runs = runs_from(&pairs);
        let classified = classify(&definitions(), runs);
        let orphan_ids: HashSet<u64> = classified.orphans.iter().map(|r| r.id.0).collect();

        for policy in [
            None,
            Some(RetentionPolicy::KeepLastN(keep)),
            Some(RetentionPolicy::MaxAgeDays(keep)),
        ] {
            let plan = build_plan(&classified, policy, base_time());
            let eligible: HashSet<u64> = plan.iter_runs().map(|r| r.id.0).collect();
            prop_assert!(orphan_ids.is_subset(&eligible));
        }
    }
}
