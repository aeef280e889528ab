//! Watchdog lifecycle: a watchdog instance plus the driver that scans it.

use chanwdt::{Clock, MonotonicClock, Watchdog, WatchdogResult};
use std::sync::Arc;
use tracing::info;

use crate::config::ServiceConfig;
use crate::driver::{DriverCadence, PeriodicDriver};

/// A running watchdog: the channel table and its periodic driver thread.
///
/// [`init`](Self::init) brings the watchdog up and starts scanning;
/// [`cleanup`](Self::cleanup) stops the driver and deactivates every channel.
/// Dropping the service performs the cleanup.
///
/// # Example
///
/// ```rust
/// use chanwdt_service::prelude::*;
/// use std::time::Duration;
///
/// let mut service: WatchdogService<&str> = WatchdogService::init(ServiceConfig::default())?;
/// let watchdog = service.watchdog();
///
/// let id = watchdog.add_with_handler(
///     Duration::from_secs(5),
///     |id, task| eprintln!("{task} stalled on {id}"),
///     "io-task",
/// )?;
/// watchdog.feed(id)?;
///
/// service.cleanup();
/// assert!(!service.is_running());
/// # Ok::<(), WatchdogError>(())
/// ```
pub struct WatchdogService<T = (), C = MonotonicClock>
where
    T: Send + 'static,
    C: Clock + 'static,
{
    config: ServiceConfig,
    watchdog: Arc<Watchdog<T, C>>,
    driver: Option<PeriodicDriver>,
}

impl<T: Send + 'static> WatchdogService<T, MonotonicClock> {
    /// Start a watchdog timed by a [`MonotonicClock`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the driver thread
    /// cannot be spawned.
    pub fn init(config: ServiceConfig) -> WatchdogResult<Self> {
        Self::init_with_clock(config, MonotonicClock::new())
    }
}

impl<T: Send + 'static, C: Clock + 'static> WatchdogService<T, C> {
    /// Start a watchdog timed by `clock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the driver thread
    /// cannot be spawned. On error nothing is left running.
    pub fn init_with_clock(config: ServiceConfig, clock: C) -> WatchdogResult<Self> {
        config.validate()?;
        let watchdog = Arc::new(Watchdog::with_clock(config.watchdog.clone(), clock)?);
        watchdog.init();

        let driver = match PeriodicDriver::start(
            Arc::clone(&watchdog),
            DriverCadence::from_config(&config),
            &config.thread_name,
        ) {
            Ok(driver) => driver,
            Err(err) => {
                watchdog.cleanup();
                return Err(err);
            }
        };

        info!(
            poll_interval_ms = config.poll_interval_ms,
            wake_strategy = ?config.wake_strategy,
            "Watchdog service started"
        );
        Ok(Self {
            config,
            watchdog,
            driver: Some(driver),
        })
    }

    /// Shared handle to the watchdog for registering and feeding channels.
    #[must_use]
    pub fn watchdog(&self) -> &Arc<Watchdog<T, C>> {
        &self.watchdog
    }

    /// The service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// True between `init` and `cleanup`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.driver.as_ref().is_some_and(PeriodicDriver::is_running)
    }

    /// Scans completed by the driver so far.
    #[must_use]
    pub fn scan_count(&self) -> u64 {
        self.driver.as_ref().map_or(0, PeriodicDriver::scan_count)
    }

    /// Stop the driver, then deactivate every channel. Idempotent.
    ///
    /// Clones of the watchdog handle stay valid but reject mutations with
    /// `NotInitialized` afterwards.
    pub fn cleanup(&mut self) {
        let Some(mut driver) = self.driver.take() else {
            return;
        };
        driver.stop();
        self.watchdog.cleanup();
        info!("Watchdog service stopped");
    }
}

impl<T: Send + 'static, C: Clock + 'static> Drop for WatchdogService<T, C> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl<T: Send + 'static, C: Clock + 'static> std::fmt::Debug for WatchdogService<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchdogService")
            .field("config", &self.config)
            .field("watchdog", &self.watchdog)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanwdt::ManualClock;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_lifecycle_logs_start_and_stop() -> WatchdogResult<()> {
        let mut service: WatchdogService<(), ManualClock> =
            WatchdogService::init_with_clock(ServiceConfig::default(), ManualClock::new())?;
        assert!(service.is_running());
        assert!(service.watchdog().is_initialized());

        service.cleanup();
        assert!(!service.is_running());
        assert!(!service.watchdog().is_initialized());

        assert!(logs_contain("Watchdog service started"));
        assert!(logs_contain("Watchdog service stopped"));
        Ok(())
    }

    #[test]
    fn test_invalid_config_starts_nothing() {
        let config = ServiceConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        let result: WatchdogResult<WatchdogService> = WatchdogService::init(config);
        assert!(matches!(
            result,
            Err(chanwdt::WatchdogError::InvalidConfiguration(_))
        ));
    }
}
