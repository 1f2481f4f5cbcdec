//! # Runsweep
//!
//! Retention-policy pruning for GitHub Actions workflow run history.
//!
//! Runsweep inventories every workflow run in a repository, separates runs
//! whose defining workflow still exists ("active") from runs whose workflow
//! file was removed ("orphan"), computes which runs a retention policy makes
//! eligible for deletion, and deletes them with a rate-limit-aware, paced
//! worker pool. A dry-run mode reports the full deletion plan and an API
//! budget estimate without issuing a single destructive request.
//!
//! ## Pipeline
//!
//! ```text
//! Collector -> Classifier -> Retention Selector -> Deletion Executor
//!                                                        |
//!                                   Rate Limit Tracker --+--> SweepSummary
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use runsweep::{GithubClient, SweepConfig, SweepService};
//! use std::sync::Arc;
//!
//! let config = SweepConfig::new("rust-lang/rust".parse()?).with_min_runs(10);
//! let host = Arc::new(GithubClient::new(token));
//! let summary = SweepService::new(host, config).run().await?;
//! println!("{} runs eligible", summary.eligible_count);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use chrono::{DateTime, Utc};
use thiserror::Error as ThisError;

// Module declarations
pub mod classify;
pub mod config;
pub mod executor;
pub mod github;
pub mod inventory;
pub mod models;
pub mod observability;
pub mod ratelimit;
pub mod report;
pub mod retention;
pub mod services;

// Re-exports for convenience
pub use config::SweepConfig;
pub use executor::{BudgetEstimate, DeletionExecutor, ExecutorConfig};
pub use github::{GithubClient, Page, WorkflowHost};
pub use models::{
    DeletionOutcome, OutcomeStatus, RateLimitSnapshot, RepoRef, RetentionPolicy, RunId,
    WorkflowDefinition, WorkflowId, WorkflowRun,
};
pub use report::SweepSummary;
pub use services::SweepService;

/// Error type for runsweep operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidConfig` | Conflicting retention options, zero policy values, malformed repository reference, missing token |
/// | `ApiFailed` | An API request failed (network error, unexpected status, undecodable body) |
/// | `BudgetExhausted` | The API reported an exhausted request budget mid-pagination |
/// | `InsufficientBudget` | The pre-flight check refused to start a delete batch |
/// | `Artifact` | The summary artifact could not be written |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid configuration was provided.
    ///
    /// Raised before any API call is made:
    /// - Both `min_runs` and `max_days` supplied
    /// - A policy value of zero
    /// - A repository reference that does not resolve to `owner/name`
    /// - No authentication token available
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An API request failed.
    ///
    /// Raised when:
    /// - The request could not be sent (connect/timeout/request errors)
    /// - The API returned a non-success status
    /// - The response body failed to decode
    #[error("api operation '{operation}' failed: {cause}")]
    ApiFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The request budget is exhausted.
    ///
    /// Distinguishable from other API failures so the collector can fail
    /// fast instead of grinding through doomed pagination.
    #[error("rate limit budget exhausted, resets at {reset_at}")]
    BudgetExhausted {
        /// When the budget resets (UTC).
        reset_at: DateTime<Utc>,
    },

    /// The planned delete batch does not fit in the remaining budget.
    ///
    /// A clean pre-flight refusal, not a mid-batch crash. The batch never
    /// starts; calling automation can re-run after the reset.
    #[error(
        "insufficient rate limit budget: estimated cost {required} exceeds usable remaining {remaining}"
    )]
    InsufficientBudget {
        /// Estimated request cost of the batch.
        required: u64,
        /// Usable remaining budget at check time.
        remaining: u64,
    },

    /// The summary artifact could not be written.
    #[error("artifact write failed: {cause}")]
    Artifact {
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for runsweep operations.
pub type Result<T> = std::result::Result<T, Error>;
