//! Service configuration: driver cadence plus the watchdog instance settings.

use chanwdt::{WatchdogConfig, WatchdogError, WatchdogResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default scan cadence of the periodic driver.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// How the driver chooses the wait between two scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeStrategy {
    /// Always wait `poll_interval_ms`.
    #[default]
    Fixed,
    /// Wake at the earliest pending deadline, bounded by
    /// `min_poll_interval_ms` and `poll_interval_ms`.
    NextDeadline,
}

/// Configuration for a [`WatchdogService`](crate::WatchdogService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Watchdog instance settings.
    pub watchdog: WatchdogConfig,
    /// Longest wait between two scans (milliseconds).
    pub poll_interval_ms: u64,
    /// Shortest wait between two scans under `NextDeadline` (milliseconds).
    pub min_poll_interval_ms: u64,
    /// Wait selection.
    pub wake_strategy: WakeStrategy,
    /// Name given to the driver thread.
    pub thread_name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            watchdog: WatchdogConfig::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            min_poll_interval_ms: 1,
            wake_strategy: WakeStrategy::default(),
            thread_name: "chanwdt-driver".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> WatchdogResult<()> {
        self.watchdog.validate()?;
        if self.poll_interval_ms == 0 {
            return Err(WatchdogError::invalid_configuration(
                "poll_interval_ms must be greater than 0",
            ));
        }
        if self.min_poll_interval_ms == 0 {
            return Err(WatchdogError::invalid_configuration(
                "min_poll_interval_ms must be greater than 0",
            ));
        }
        if self.min_poll_interval_ms > self.poll_interval_ms {
            return Err(WatchdogError::invalid_configuration(
                "min_poll_interval_ms must not exceed poll_interval_ms",
            ));
        }
        if self.thread_name.trim().is_empty() {
            return Err(WatchdogError::invalid_configuration(
                "thread_name must not be empty",
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or the result is invalid.
    pub fn from_json_str(json: &str) -> WatchdogResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| WatchdogError::invalid_configuration(format!("malformed JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns a platform error if the file cannot be read, otherwise the
    /// errors of [`from_json_str`](Self::from_json_str).
    pub fn from_json_file(path: impl AsRef<Path>) -> WatchdogResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            WatchdogError::platform(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    /// Longest wait between two scans.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Shortest wait between two scans.
    #[must_use]
    pub fn min_poll_interval(&self) -> Duration {
        Duration::from_millis(self.min_poll_interval_ms)
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }
}

/// Builder for `ServiceConfig`.
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Set the watchdog instance settings.
    #[must_use]
    pub fn watchdog(mut self, watchdog: WatchdogConfig) -> Self {
        self.config.watchdog = watchdog;
        self
    }

    /// Set the scan cadence in milliseconds.
    #[must_use]
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the shortest wait in milliseconds.
    #[must_use]
    pub fn min_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.min_poll_interval_ms = ms;
        self
    }

    /// Set the wake strategy.
    #[must_use]
    pub fn wake_strategy(mut self, strategy: WakeStrategy) -> Self {
        self.config.wake_strategy = strategy;
        self
    }

    /// Set the driver thread name.
    #[must_use]
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> WatchdogResult<ServiceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
