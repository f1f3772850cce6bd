//! Structured logging setup for the command-line tool

use crate::io::error::{Result, invalid_parameter};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the default log filter
pub const LOG_ENV_VAR: &str = "HYPERTILE_LOG";

/// Default filter directive for the requested verbosity
///
/// `quiet` wins over `verbose`.
pub const fn default_filter(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (_, true) => "error",
        (true, false) => "hypertile=debug,info",
        (false, false) => "hypertile=info,warn",
    }
}

/// Filter from `HYPERTILE_LOG`, falling back to [`default_filter`]
///
/// # Errors
///
/// Returns a configuration error if the fallback directive does not parse
pub fn build_filter(verbose: bool, quiet: bool) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV_VAR) {
        return Ok(filter);
    }
    let directive = default_filter(verbose, quiet);
    EnvFilter::try_new(directive).map_err(|e| invalid_parameter("log_filter", &directive, &e))
}

/// Install a global fmt subscriber writing to stderr
///
/// # Errors
///
/// Returns a configuration error if the filter is invalid or a global
/// subscriber is already installed
pub fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = build_filter(verbose, quiet)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| invalid_parameter("logging", &"global subscriber", &e))
}
