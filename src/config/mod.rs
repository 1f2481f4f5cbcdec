//! Configuration management.
//!
//! Settings are layered: defaults, then an optional TOML file, then
//! environment variables, then CLI flags (applied by the binary). Retention
//! options are validated here, before any API call is made.

use crate::executor::ExecutorConfig;
use crate::models::{RepoRef, RetentionPolicy};
use crate::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// API client settings.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// API endpoint (override for GitHub Enterprise or tests).
    pub endpoint: String,
    /// Items per page for list endpoints.
    pub page_size: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: crate::github::GithubClient::DEFAULT_ENDPOINT.to_string(),
            page_size: crate::github::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Main configuration for a sweep invocation.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Target repository.
    pub repo: RepoRef,
    /// Preview mode; no destructive requests when `true`.
    pub dry_run: bool,
    /// Keep the N most-recent runs per workflow.
    pub min_runs: Option<u32>,
    /// Keep runs created within the last N days.
    pub max_days: Option<u32>,
    /// Where to write the summary artifact, if anywhere.
    pub artifact_path: Option<PathBuf>,
    /// Deletion executor settings.
    pub executor: ExecutorConfig,
    /// API client settings.
    pub api: ApiSettings,
}

impl SweepConfig {
    /// Creates a configuration for a repository with defaults everywhere
    /// else (dry run on, no policy).
    #[must_use]
    pub fn new(repo: RepoRef) -> Self {
        Self {
            repo,
            dry_run: true,
            min_runs: None,
            max_days: None,
            artifact_path: None,
            executor: ExecutorConfig::default(),
            api: ApiSettings::default(),
        }
    }

    /// Sets dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the keep-last-N option.
    #[must_use]
    pub const fn with_min_runs(mut self, min_runs: u32) -> Self {
        self.min_runs = Some(min_runs);
        self
    }

    /// Sets the max-age option.
    #[must_use]
    pub const fn with_max_days(mut self, max_days: u32) -> Self {
        self.max_days = Some(max_days);
        self
    }

    /// Sets the artifact output path.
    #[must_use]
    pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = Some(path.into());
        self
    }

    /// Sets the executor configuration.
    #[must_use]
    pub fn with_executor(mut self, executor: ExecutorConfig) -> Self {
        self.executor = executor;
        self
    }

    /// Validates the retention options into a policy.
    ///
    /// `Ok(None)` means an orphan-only sweep.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` for conflicting or zero options.
    pub fn policy(&self) -> Result<Option<RetentionPolicy>> {
        RetentionPolicy::from_options(self.min_runs, self.max_days)
    }

    /// Merges settings from a TOML config file (file values win over
    /// current values only where present).
    #[must_use]
    pub fn merge_file(mut self, file: &ConfigFile) -> Self {
        if let Some(ref endpoint) = file.api_endpoint {
            self.api.endpoint.clone_from(endpoint);
        }
        if let Some(page_size) = file.page_size {
            self.api.page_size = page_size;
        }
        if let Some(workers) = file.workers {
            self.executor.workers = workers.max(1);
        }
        if let Some(delay_ms) = file.delete_delay_ms {
            self.executor.post_delete_delay = Duration::from_millis(delay_ms);
        }
        if let Some(cost) = file.cost_per_delete {
            self.executor.cost_per_delete = cost.max(1);
        }
        if let Some(headroom) = file.budget_headroom {
            self.executor.budget_headroom = headroom.clamp(0.0, 1.0);
        }
        if let Some(ref artifact) = file.artifact_path {
            self.artifact_path = Some(PathBuf::from(artifact));
        }
        self
    }

    /// Applies environment variable overrides to the executor settings.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        self.executor = self.executor.with_env_overrides();
        self
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// API endpoint override.
    pub api_endpoint: Option<String>,
    /// Page size for list endpoints.
    pub page_size: Option<usize>,
    /// Delete worker count.
    pub workers: Option<usize>,
    /// Post-delete pause in milliseconds.
    pub delete_delay_ms: Option<u64>,
    /// Budget cost per delete.
    pub cost_per_delete: Option<u64>,
    /// Usable budget fraction.
    pub budget_headroom: Option<f64>,
    /// Artifact output path.
    pub artifact_path: Option<String>,
}

impl ConfigFile {
    /// Loads a config file from a path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;

        toml::from_str(&contents).map_err(|e| {
            crate::Error::InvalidConfig(format!("cannot parse {}: {e}", path.display()))
        })
    }
}
