//! Error types for the watchdog system.
//!
//! Every error is returned synchronously from the operation that detected it.
//! The one condition that is not an error, an expired channel with no handler
//! bound, is governed by [`MissingHandlerPolicy`](crate::MissingHandlerPolicy).

use thiserror::Error;

use crate::channel::ChannelId;

/// Errors that can occur during watchdog operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchdogError {
    /// A mutation was attempted before `init()` or after `cleanup()`.
    #[error("Watchdog not initialized")]
    NotInitialized,

    /// An argument was rejected, e.g. a zero reload period.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The handle is out of range or refers to an inactive channel.
    #[error("Invalid channel handle: {0}")]
    InvalidHandle(ChannelId),

    /// Every channel slot is active.
    #[error("No available watchdog channels (capacity {capacity})")]
    CapacityExceeded {
        /// Fixed capacity of the channel table.
        capacity: usize,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The platform layer failed (thread spawn, config I/O).
    #[error("Platform error: {0}")]
    Platform(String),
}

impl WatchdogError {
    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Create a platform error.
    #[must_use]
    pub fn platform(reason: impl Into<String>) -> Self {
        Self::Platform(reason.into())
    }
}

/// A specialized `Result` type for watchdog operations.
pub type WatchdogResult<T> = std::result::Result<T, WatchdogError>;
