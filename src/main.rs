//! Binary entry point for runsweep.
//!
//! Parses the CLI, assembles the sweep configuration (file < env < flags),
//! and runs one sweep invocation against the GitHub API.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stdout/print_stderr in the main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use runsweep::config::ConfigFile;
use runsweep::{
    Error, ExecutorConfig, GithubClient, RepoRef, SweepConfig, SweepService, SweepSummary,
    WorkflowHost,
};
use runsweep::observability::{self, LoggingConfig};
use secrecy::SecretString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Runsweep - retention-policy pruning for GitHub Actions workflow runs.
#[derive(Parser)]
#[command(name = "runsweep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Repository, e.g. `owner/repo` or `https://github.com/owner/repo`.
    #[arg(long, env = "RUNSWEEP_REPO")]
    repo_url: String,

    /// Preview mode: report the plan and budget estimate, delete nothing.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    dry_run: bool,

    /// Keep the N most-recent runs in each workflow; delete the rest.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    min_runs: Option<u32>,

    /// Keep runs newer than N days; delete strictly older runs.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_days: Option<u32>,

    /// Write the machine-readable summary to this path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of delete workers.
    #[arg(long)]
    workers: Option<usize>,

    /// Pause after each completed delete, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Path to a TOML settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    // Pick up GH_TOKEN from a .env file when present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    observability::init(LoggingConfig {
        verbose: cli.verbose,
        json: cli.json_logs,
    });

    match run(cli).await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {e}");
            if let Error::InsufficientBudget { .. } = e {
                eprintln!("Nothing was deleted; re-run after the rate limit resets or segment the sweep.");
            }
            ExitCode::FAILURE
        },
    }
}

/// Builds the configuration and runs the sweep.
async fn run(cli: Cli) -> Result<SweepSummary, Error> {
    let repo: RepoRef = cli.repo_url.parse()?;

    let mut config = SweepConfig::new(repo)
        .with_dry_run(cli.dry_run)
        .with_executor(ExecutorConfig::from_env());
    config.min_runs = cli.min_runs;
    config.max_days = cli.max_days;

    if let Some(ref path) = cli.config {
        let file = ConfigFile::load(path)?;
        config = config.merge_file(&file);
    }
    if let Some(workers) = cli.workers {
        config.executor.workers = workers.max(1);
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.executor.post_delete_delay = Duration::from_millis(delay_ms);
    }
    if let Some(output) = cli.output {
        config.artifact_path = Some(output);
    }

    // Surface configuration problems before touching the network.
    config.policy()?;
    let token = github_token()?;

    let client = GithubClient::new(token)
        .with_endpoint(config.api.endpoint.clone())
        .with_page_size(config.api.page_size);
    let host: Arc<dyn WorkflowHost> = Arc::new(client);

    SweepService::new(host, config).run().await
}

/// Reads the GitHub token from the environment.
fn github_token() -> Result<SecretString, Error> {
    match std::env::var("GH_TOKEN") {
        Ok(token) if !token.trim().is_empty() => Ok(SecretString::from(token)),
        _ => Err(Error::InvalidConfig(
            "environment variable GH_TOKEN not found".to_string(),
        )),
    }
}

/// Prints the human-readable summary to stdout.
fn print_summary(summary: &SweepSummary) {
    println!("Repository: {}", summary.repository);
    println!();
    println!("Total workflow runs : {}", summary.total_runs);
    println!("Orphan workflow runs: {}", summary.orphan_runs);
    println!("Active workflow runs: {}", summary.active_runs);

    if !summary.active_by_workflow.is_empty() {
        println!();
        println!("Active runs by workflow:");
        for count in &summary.active_by_workflow {
            println!("  {:<40} {}", count.workflow, count.runs);
        }
    }

    if summary.eligible_count > 0 {
        println!();
        println!("Eligible for deletion:");
        for group in &summary.eligible {
            let label = group.workflow.as_deref().unwrap_or("(orphan)");
            println!("  {:<40} {}", label, group.run_ids.len());
        }
    }

    println!();
    println!("Rate limit remaining: {}", summary.rate_limit_remaining);
    println!(
        "Rate limit reset at : {} (UTC)",
        summary.rate_limit_reset_at
    );

    if summary.dry_run {
        println!();
        println!(
            "Estimated API cost  : {} ({} runs x {} per delete)",
            summary.estimate.estimated_cost, summary.eligible_count, summary.estimate.cost_per_delete
        );
        let verdict = if summary.estimate.sufficient {
            "yes"
        } else {
            "no (segment this sweep into multiple runs)"
        };
        println!("Enough budget to delete now? {verdict}");
    }

    println!();
    println!("{}", summary.digest());
}
