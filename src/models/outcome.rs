//! Deletion outcomes and rate-limit snapshots.

use super::RunId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The result of one attempted deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "kebab-case")]
pub enum OutcomeStatus {
    /// The run was deleted.
    Deleted,
    /// The delete request failed; the reason is carried for follow-up.
    ///
    /// Failures are isolated per run and never abort the remaining batch.
    Failed(String),
    /// Dry-run mode: no request was made.
    SkippedDryRun,
}

impl OutcomeStatus {
    /// Returns `true` for the `Deleted` variant.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Returns `true` for the `Failed` variant.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Per-run record of a deletion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    /// The run the attempt targeted.
    pub run_id: RunId,
    /// What happened.
    #[serde(flatten)]
    pub status: OutcomeStatus,
    /// When the attempt was made (UTC).
    pub attempted_at: DateTime<Utc>,
}

impl DeletionOutcome {
    /// Records an outcome stamped with the current time.
    #[must_use]
    pub fn now(run_id: RunId, status: OutcomeStatus) -> Self {
        Self {
            run_id,
            status,
            attempted_at: Utc::now(),
        }
    }
}

/// A point-in-time view of the API request budget.
///
/// Captured lazily from the platform's rate-limit endpoint (a constant-cost
/// call that does not consume the core budget).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitSnapshot {
    /// Requests remaining before the limit resets.
    pub remaining: u64,
    /// When the budget resets (UTC).
    pub reset_at: DateTime<Utc>,
}

impl RateLimitSnapshot {
    /// Whether a batch of the given request cost fits in the remaining
    /// budget.
    #[must_use]
    pub const fn allows(&self, cost: u64) -> bool {
        cost <= self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_status_json_shape() {
        let deleted = serde_json::to_value(OutcomeStatus::Deleted).unwrap();
        assert_eq!(deleted["status"], "deleted");

        let failed = serde_json::to_value(OutcomeStatus::Failed("HTTP 500".to_string())).unwrap();
        assert_eq!(failed["status"], "failed");
        assert_eq!(failed["reason"], "HTTP 500");

        let skipped = serde_json::to_value(OutcomeStatus::SkippedDryRun).unwrap();
        assert_eq!(skipped["status"], "skipped-dry-run");
    }

    #[test]
    fn test_snapshot_allows() {
        let snapshot = RateLimitSnapshot {
            remaining: 10,
            reset_at: Utc::now(),
        };
        assert!(snapshot.allows(10));
        assert!(!snapshot.allows(11));
        assert!(snapshot.allows(0));
    }

    #[test]
    fn test_outcome_flattens_status() {
        let outcome = DeletionOutcome::now(RunId(99), OutcomeStatus::Deleted);
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["run_id"], 99);
        assert_eq!(value["status"], "deleted");
    }
}
