//! Structured logging setup for the scanguard binary.

use tracing_subscriber::EnvFilter;

/// Crate-specific override, read when `RUST_LOG` is unset
pub const LOG_ENV: &str = "SCANGUARD_LOG";

/// Filter directive when neither variable is set
pub fn default_directive() -> String {
    format!("{}=info", env!("CARGO_CRATE_NAME"))
}

/// Resolves the filter directive: `RUST_LOG`, then `SCANGUARD_LOG`, then the default
pub fn filter_directive(rust_log: Option<String>, crate_log: Option<String>) -> String {
    rust_log
        .filter(|value| !value.trim().is_empty())
        .or_else(|| crate_log.filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(default_directive)
}

/// Installs the global subscriber writing to stderr; `verbose` raises the default to debug
///
/// Calling it twice is harmless: the second installation is ignored.
pub fn initialize_logging(verbose: bool) {
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), std::env::var(LOG_ENV).ok());
    let directive = if verbose && directive == default_directive() {
        format!("{}=debug", env!("CARGO_CRATE_NAME"))
    } else {
        directive
    };

    let filter =
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(default_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
