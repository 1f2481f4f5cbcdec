//! Rate limit tracking.
//!
//! Wraps the host capability's rate-limit endpoint (a constant-cost call
//! that does not itself consume the core budget) and caches at most one
//! snapshot per sweep phase. The tracker is consulted once before inventory
//! and once before deletion; repeated queries within a phase reuse the
//! cached snapshot instead of re-hitting the endpoint.

use crate::Result;
use crate::github::WorkflowHost;
use crate::models::RateLimitSnapshot;
use std::sync::{Arc, Mutex};
use tracing::info;

/// The two phases that consult the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    /// Before inventory collection.
    Inventory,
    /// Before the delete batch (or the dry-run estimate).
    Deletion,
}

/// Per-phase cached view of the request budget.
pub struct RateLimitTracker {
    host: Arc<dyn WorkflowHost>,
    cached: Mutex<Option<(SweepPhase, RateLimitSnapshot)>>,
}

impl RateLimitTracker {
    /// Creates a tracker over the given host.
    #[must_use]
    pub fn new(host: Arc<dyn WorkflowHost>) -> Self {
        Self {
            host,
            cached: Mutex::new(None),
        }
    }

    /// Returns the budget snapshot for a phase.
    ///
    /// Queries the host once per phase; a second call within the same phase
    /// returns the cached snapshot. Entering a new phase refreshes.
    ///
    /// # Errors
    ///
    /// Propagates the host's rate-limit query failure.
    pub async fn snapshot(&self, phase: SweepPhase) -> Result<RateLimitSnapshot> {
        {
            let cached = self.cached.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some((cached_phase, snapshot)) = *cached {
                if cached_phase == phase {
                    return Ok(snapshot);
                }
            }
        }

        let snapshot = self.host.rate_limit().await?;
        info!(
            phase = ?phase,
            remaining = snapshot.remaining,
            reset_at = %snapshot.reset_at,
            "Rate limit snapshot"
        );

        let mut cached = self.cached.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *cached = Some((phase, snapshot));
        Ok(snapshot)
    }
}
