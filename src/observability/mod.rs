//! Logging initialization.
//!
//! One-shot CLI flavor: a `tracing-subscriber` fmt layer with an env
//! filter, optionally JSON-formatted for log collectors. Metrics emitted
//! through the `metrics` facade stay no-ops unless a recorder is installed
//! by an embedding application.

use tracing_subscriber::EnvFilter;

/// Environment variable controlling the log filter.
pub const LOG_FILTER_ENV: &str = "RUNSWEEP_LOG";

/// Logging configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingConfig {
    /// Lower the default filter to `debug`.
    pub verbose: bool,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

/// Initializes the global tracing subscriber.
///
/// Filter precedence: `RUNSWEEP_LOG`, then `RUST_LOG`, then the default
/// (`info`, or `debug` with `verbose`). Logs go to stderr so stdout stays
/// clean for the summary output.
pub fn init(config: LoggingConfig) {
    let default_filter = if config.verbose {
        "runsweep=debug,info"
    } else {
        "runsweep=info,warn"
    };

    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // A second init (tests, embedding) is not an error worth surfacing.
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        tracing::debug!("tracing subscriber already initialized: {e}");
    }
}
