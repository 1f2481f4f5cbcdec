//! Retention policy.

use crate::{Error, Result};
use serde::Serialize;

/// The rule determining which runs are exempt from deletion.
///
/// Exactly one variant applies per invocation; supplying both options is a
/// configuration error, supplying neither degrades the sweep to orphan-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep the N most-recent runs per workflow; older runs are eligible.
    KeepLastN(u32),
    /// Keep runs created within the last N days; strictly older runs are
    /// eligible.
    MaxAgeDays(u32),
}

impl RetentionPolicy {
    /// Builds a policy from the two mutually exclusive user options.
    ///
    /// Returns `Ok(None)` when neither option is supplied (orphan-only
    /// sweep).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` when both options are supplied, or
    /// when a supplied value is zero.
    pub fn from_options(min_runs: Option<u32>, max_days: Option<u32>) -> Result<Option<Self>> {
        match (min_runs, max_days) {
            (Some(_), Some(_)) => Err(Error::InvalidConfig(
                "only one of min-runs or max-days may be given".to_string(),
            )),
            (Some(0), None) | (None, Some(0)) => Err(Error::InvalidConfig(
                "retention values must be positive".to_string(),
            )),
            (Some(n), None) => Ok(Some(Self::KeepLastN(n))),
            (None, Some(d)) => Ok(Some(Self::MaxAgeDays(d))),
            (None, None) => Ok(None),
        }
    }

    /// Echo of the `min_runs` option, for reporting.
    #[must_use]
    pub const fn min_runs(&self) -> Option<u32> {
        match self {
            Self::KeepLastN(n) => Some(*n),
            Self::MaxAgeDays(_) => None,
        }
    }

    /// Echo of the `max_days` option, for reporting.
    #[must_use]
    pub const fn max_days(&self) -> Option<u32> {
        match self {
            Self::KeepLastN(_) => None,
            Self::MaxAgeDays(d) => Some(*d),
        }
    }
}
