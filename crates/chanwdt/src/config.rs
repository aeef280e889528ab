//! Watchdog instance configuration.

use serde::{Deserialize, Serialize};

use crate::error::{WatchdogError, WatchdogResult};

/// Number of channel slots in a default watchdog.
pub const DEFAULT_CAPACITY: usize = 16;

/// Upper bound on the channel table size.
///
/// Allocation and scanning are linear in the capacity, so the table is kept
/// small.
pub const MAX_CAPACITY: usize = 256;

/// What the scanner does when a channel expires with no handler bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingHandlerPolicy {
    /// Log at fatal severity and abort the process.
    #[default]
    Abort,
    /// Log the expiry and list the channel in the scan report.
    Report,
}

/// Configuration for a single watchdog instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Fixed number of channel slots.
    pub capacity: usize,
    /// Escalation for channels that expire without a handler.
    pub missing_handler_policy: MissingHandlerPolicy,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            missing_handler_policy: MissingHandlerPolicy::default(),
        }
    }
}

impl WatchdogConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the capacity is zero or above [`MAX_CAPACITY`].
    pub fn validate(&self) -> WatchdogResult<()> {
        if self.capacity == 0 {
            return Err(WatchdogError::invalid_configuration(
                "capacity must be greater than 0",
            ));
        }
        if self.capacity > MAX_CAPACITY {
            return Err(WatchdogError::invalid_configuration(format!(
                "capacity must not exceed {MAX_CAPACITY}"
            )));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> WatchdogConfigBuilder {
        WatchdogConfigBuilder::default()
    }
}

/// Builder for `WatchdogConfig`.
#[derive(Debug, Default)]
pub struct WatchdogConfigBuilder {
    config: WatchdogConfig,
}

impl WatchdogConfigBuilder {
    /// Set the number of channel slots.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the missing-handler policy.
    #[must_use]
    pub fn missing_handler_policy(mut self, policy: MissingHandlerPolicy) -> Self {
        self.config.missing_handler_policy = policy;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> WatchdogResult<WatchdogConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
