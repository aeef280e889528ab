//! Periodic driver thread.
//!
//! The driver owns a background thread that calls [`Watchdog::process`] on a
//! cadence until stopped. The stop signal travels over a `crossbeam` channel
//! whose `recv_timeout` doubles as the inter-scan sleep, so a stop request
//! interrupts the wait immediately.

use chanwdt::{Clock, Watchdog, WatchdogError, WatchdogResult};
use crossbeam::channel::{RecvTimeoutError, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::{ServiceConfig, WakeStrategy};

/// Wait policy resolved from a [`ServiceConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverCadence {
    /// Longest wait between scans.
    pub poll_interval: Duration,
    /// Shortest wait between scans.
    pub min_poll_interval: Duration,
    /// Wait selection.
    pub wake_strategy: WakeStrategy,
}

impl DriverCadence {
    /// Take the cadence settings out of a service configuration.
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            min_poll_interval: config.min_poll_interval(),
            wake_strategy: config.wake_strategy,
        }
    }

    /// Wait before the next scan given the time left to the earliest deadline.
    #[must_use]
    pub fn next_wait(&self, until_next_timeout: Option<Duration>) -> Duration {
        match (self.wake_strategy, until_next_timeout) {
            (WakeStrategy::Fixed, _) | (WakeStrategy::NextDeadline, None) => self.poll_interval,
            (WakeStrategy::NextDeadline, Some(remaining)) => remaining
                .min(self.poll_interval)
                .max(self.min_poll_interval),
        }
    }
}

/// Background thread that scans a watchdog until stopped.
#[derive(Debug)]
pub struct PeriodicDriver {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
    scans: Arc<AtomicU64>,
}

impl PeriodicDriver {
    /// Spawn the driver thread for `watchdog`.
    ///
    /// # Errors
    ///
    /// Returns a platform error if the thread cannot be spawned.
    pub fn start<T, C>(
        watchdog: Arc<Watchdog<T, C>>,
        cadence: DriverCadence,
        thread_name: &str,
    ) -> WatchdogResult<Self>
    where
        T: Send + 'static,
        C: Clock + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let scans = Arc::new(AtomicU64::new(0));
        let thread_scans = Arc::clone(&scans);

        let thread = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                debug!(?cadence, "Watchdog driver thread started");
                loop {
                    let report = watchdog.process();
                    thread_scans.fetch_add(1, Ordering::Relaxed);
                    if !report.is_empty() {
                        debug!(
                            fired = report.fired.len(),
                            panicked = report.panicked.len(),
                            "Watchdog scan fired channels"
                        );
                    }

                    let wait = cadence.next_wait(watchdog.time_until_next_timeout());
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Watchdog driver thread exiting");
            })
            .map_err(|e| {
                error!(error = %e, "Failed to create watchdog driver thread");
                WatchdogError::platform(format!("failed to spawn driver thread: {e}"))
            })?;

        info!(thread = thread_name, "Watchdog driver started");
        Ok(Self {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
            scans,
        })
    }

    /// True while the driver thread is alive and [`stop`](Self::stop) has
    /// not been called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|thread| !thread.is_finished())
    }

    /// Scans completed by the driver thread.
    #[must_use]
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Signal the thread and wait for it to exit. Idempotent.
    ///
    /// A scan in progress, including its handlers, runs to completion first.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // A full channel or a dead receiver both mean the thread is leaving.
            if stop_tx.try_send(()).is_err() {
                debug!("Watchdog driver already signalled");
            }
        }

        if let Some(thread) = self.thread.take() {
            match thread.join() {
                Ok(()) => info!(scans = self.scan_count(), "Watchdog driver stopped cleanly"),
                Err(_) => error!("Watchdog driver thread panicked"),
            }
        }
    }
}

impl Drop for PeriodicDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cadence(strategy: WakeStrategy) -> DriverCadence {
        DriverCadence {
            poll_interval: Duration::from_millis(100),
            min_poll_interval: Duration::from_millis(5),
            wake_strategy: strategy,
        }
    }

    #[test]
    fn test_fixed_wait_ignores_deadlines() {
        let cadence = cadence(WakeStrategy::Fixed);
        assert_eq!(cadence.next_wait(None), Duration::from_millis(100));
        assert_eq!(
            cadence.next_wait(Some(Duration::from_millis(3))),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn test_next_deadline_wait_is_bounded() {
        let cadence = cadence(WakeStrategy::NextDeadline);
        assert_eq!(cadence.next_wait(None), Duration::from_millis(100));
        assert_eq!(
            cadence.next_wait(Some(Duration::from_millis(40))),
            Duration::from_millis(40)
        );
        assert_eq!(
            cadence.next_wait(Some(Duration::from_secs(10))),
            Duration::from_millis(100)
        );
        assert_eq!(
            cadence.next_wait(Some(Duration::ZERO)),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn test_cadence_from_config() {
        let config = ServiceConfig::default();
        let cadence = DriverCadence::from_config(&config);
        assert_eq!(cadence.poll_interval, Duration::from_millis(100));
        assert_eq!(cadence.min_poll_interval, Duration::from_millis(1));
        assert_eq!(cadence.wake_strategy, WakeStrategy::Fixed);
    }
}
