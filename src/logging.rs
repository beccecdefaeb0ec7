//! Log output for the `nlq` binary.
//!
//! Logs go to **stderr** so stdout stays parseable for scripts. The filter
//! comes from `NLQ_LOG` (or `RUST_LOG`) when set, otherwise from
//! `[logging].filter` in the config file.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

const LOG_ENV: &str = "NLQ_LOG";

/// Resolve the effective filter directive.
pub fn filter_directive(config: &LoggingConfig) -> String {
    std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| config.filter.clone())
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(config: &LoggingConfig) {
    let directive = filter_directive(config);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!(
            "Warning: invalid log filter '{}': {}. Falling back to 'warn'.",
            directive, e
        );
        EnvFilter::new("warn")
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if config.format == "json" {
        builder.json().try_init()
    } else {
        builder
            .with_ansi(atty::is(atty::Stream::Stderr))
            .try_init()
    };
    // Already installed (e.g. by a test harness).
    let _ = result;
}
