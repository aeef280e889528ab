//! Logging sink setup.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a fmt
//! layer writing to stderr, leaving stdout to command output. `RUST_LOG`
//! takes precedence over the verbosity-derived default.

use chanwdt::{WatchdogError, WatchdogResult};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Map a `-v` count to a log level.
#[must_use]
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Default filter directive covering the watchdog crates.
#[must_use]
pub fn default_directive(verbosity: u8) -> String {
    let level = level_for_verbosity(verbosity);
    format!("chanwdt={level},chanwdt_service={level},chanwdt_cli={level}")
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns a platform error if a global subscriber is already installed.
pub fn init_logging(verbosity: u8) -> WatchdogResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| WatchdogError::platform(format!("failed to install logger: {e}")))
}
