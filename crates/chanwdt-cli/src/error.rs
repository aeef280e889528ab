//! Error types for the chanwdt CLI

use chanwdt::WatchdogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Watchdog error: {0}")]
    Watchdog(#[from] WatchdogError),

    #[error("{0} channel(s) timed out")]
    TimeoutsDetected(usize),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit status reported for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArgument(_) => 2,
            Self::TimeoutsDetected(_) => 3,
            Self::Watchdog(WatchdogError::InvalidConfiguration(_)) | Self::JsonError(_) => 4,
            Self::Watchdog(WatchdogError::Platform(_)) => 5,
            Self::Watchdog(_) => 1,
        }
    }
}
