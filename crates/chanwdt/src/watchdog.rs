//! Core watchdog: channel registration, feeding and timeout detection.
//!
//! This module provides the `Watchdog` struct that owns the channel table,
//! serializes every operation through a single lock, and fires expired
//! channels when the periodic driver calls [`Watchdog::process`].

use parking_lot::Mutex;
use serde::Serialize;
use std::num::NonZeroU64;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::channel::{ChannelId, ChannelInfo, NextTimeout, TimeoutHandler};
use crate::clock::{Clock, MonotonicClock};
use crate::config::{MissingHandlerPolicy, WatchdogConfig};
use crate::error::{WatchdogError, WatchdogResult};
use crate::stats::WatchdogStats;
use crate::table::ChannelTable;

/// Outcome of one timeout scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Channels that expired during the scan, in firing order.
    pub fired: Vec<ChannelId>,
    /// Expired channels that had no handler bound.
    ///
    /// Only populated under [`MissingHandlerPolicy::Report`].
    pub unhandled: Vec<ChannelId>,
    /// Expired channels whose handler panicked.
    pub panicked: Vec<ChannelId>,
}

impl ScanReport {
    /// True if nothing expired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

struct WatchdogState<T> {
    table: ChannelTable<T>,
    initialized: bool,
    enabled: bool,
    stats: WatchdogStats,
}

/// Software watchdog over a fixed set of liveness channels.
///
/// Tasks register a channel with [`add`](Self::add) and prove they are alive
/// by calling [`feed`](Self::feed) at least once per reload period. A periodic
/// driver calls [`process`](Self::process); every channel whose deadline has
/// passed is fired exactly once and then deactivated.
///
/// `T` is the context type handed back to a channel's handler. `C` is the
/// time source.
///
/// # Thread Safety
///
/// All state sits behind one `parking_lot::Mutex`. Share the watchdog with
/// `Arc` between feeding tasks and the driver.
///
/// # Handlers
///
/// Handlers run after the scan has released the lock, in channel index order,
/// so a handler may call back into the watchdog (for example to re-add its
/// channel). Handlers run on the driver thread: a handler that blocks delays
/// detection for every other channel.
///
/// # Example
///
/// ```rust
/// use chanwdt::prelude::*;
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let watchdog: Watchdog<&str, ManualClock> =
///     Watchdog::with_clock(WatchdogConfig::default(), clock.clone())?;
/// watchdog.init();
///
/// let id = watchdog.add_with_handler(
///     Duration::from_millis(100),
///     |id, task| eprintln!("{task} stalled on channel {id}"),
///     "sensor-task",
/// )?;
///
/// clock.advance(Duration::from_millis(50));
/// watchdog.feed(id)?;
/// assert!(watchdog.process().is_empty());
///
/// clock.advance(Duration::from_millis(100));
/// assert_eq!(watchdog.process().fired, vec![id]);
/// # Ok::<(), WatchdogError>(())
/// ```
pub struct Watchdog<T = (), C = MonotonicClock> {
    config: WatchdogConfig,
    clock: C,
    state: Mutex<WatchdogState<T>>,
}

impl<T> Watchdog<T, MonotonicClock> {
    /// Create an uninitialized watchdog timed by a [`MonotonicClock`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: WatchdogConfig) -> WatchdogResult<Self> {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<T, C: Clock> Watchdog<T, C> {
    /// Create an uninitialized watchdog timed by `clock`.
    ///
    /// The channel table is allocated here and never grows.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_clock(config: WatchdogConfig, clock: C) -> WatchdogResult<Self> {
        config.validate()?;
        let state = WatchdogState {
            table: ChannelTable::new(config.capacity),
            initialized: false,
            enabled: false,
            stats: WatchdogStats::default(),
        };
        Ok(Self {
            config,
            clock,
            state: Mutex::new(state),
        })
    }

    /// Start accepting channels and enable timeout detection.
    ///
    /// Starts from an empty table. Calling `init` on an initialized watchdog
    /// logs a warning and leaves it untouched.
    pub fn init(&self) {
        {
            let mut state = self.state.lock();
            if state.initialized {
                drop(state);
                warn!("Watchdog already initialized");
                return;
            }
            state.table.clear();
            state.stats = WatchdogStats::default();
            state.enabled = true;
            state.initialized = true;
        }
        info!(
            capacity = self.config.capacity,
            policy = ?self.config.missing_handler_policy,
            "Watchdog initialized successfully"
        );
    }

    /// Deactivate every channel and stop accepting operations.
    ///
    /// Pending handlers and contexts are dropped without being invoked.
    pub fn cleanup(&self) {
        let was_initialized = {
            let mut state = self.state.lock();
            let was_initialized = state.initialized;
            state.table.clear();
            state.initialized = false;
            state.enabled = false;
            was_initialized
        };
        if was_initialized {
            info!("Watchdog cleaned up");
        }
    }

    /// Register a channel and arm it immediately.
    ///
    /// The new channel's deadline is `now + reload_period`, exactly as if it
    /// had just been fed. The lowest free slot is used.
    ///
    /// # Errors
    ///
    /// - [`WatchdogError::NotInitialized`] before `init()` or after `cleanup()`
    /// - [`WatchdogError::InvalidArgument`] if `reload_period` is below 1 ms
    /// - [`WatchdogError::CapacityExceeded`] if every slot is active
    pub fn add(
        &self,
        reload_period: Duration,
        handler: Option<TimeoutHandler<T>>,
        context: T,
    ) -> WatchdogResult<ChannelId> {
        let result = {
            let mut state = self.state.lock();
            if state.initialized {
                reload_period_ms(reload_period).and_then(|period_ms| {
                    let now = self.clock.now();
                    let id = state.table.allocate(period_ms, handler, context, now)?;
                    state.stats.record_add();
                    Ok(id)
                })
            } else {
                Err(WatchdogError::NotInitialized)
            }
        };

        match &result {
            Ok(id) => info!(
                channel = %id,
                period_ms = reload_period.as_millis(),
                "Added watchdog channel"
            ),
            Err(err) => error!(error = %err, "Failed to add watchdog channel"),
        }
        result
    }

    /// Register a channel with a closure handler.
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add).
    pub fn add_with_handler<F>(
        &self,
        reload_period: Duration,
        handler: F,
        context: T,
    ) -> WatchdogResult<ChannelId>
    where
        F: FnOnce(ChannelId, T) + Send + 'static,
    {
        self.add(reload_period, Some(Box::new(handler)), context)
    }

    /// Remove an active channel without firing it.
    ///
    /// # Errors
    ///
    /// - [`WatchdogError::NotInitialized`] before `init()` or after `cleanup()`
    /// - [`WatchdogError::InvalidHandle`] if `id` is out of range or inactive
    pub fn delete(&self, id: ChannelId) -> WatchdogResult<()> {
        let result = {
            let mut state = self.state.lock();
            if state.initialized {
                state.table.release(id).map(|()| state.stats.record_delete())
            } else {
                Err(WatchdogError::NotInitialized)
            }
        };

        match &result {
            Ok(()) => info!(channel = %id, "Deleted watchdog channel"),
            Err(err) => warn!(channel = %id, error = %err, "Failed to delete watchdog channel"),
        }
        result
    }

    /// Prove liveness: push the channel's deadline to `now + reload_period`.
    ///
    /// # Errors
    ///
    /// - [`WatchdogError::NotInitialized`] before `init()` or after `cleanup()`
    /// - [`WatchdogError::InvalidHandle`] if `id` is out of range or inactive
    pub fn feed(&self, id: ChannelId) -> WatchdogResult<()> {
        let mut state = self.state.lock();
        if !state.initialized {
            return Err(WatchdogError::NotInitialized);
        }
        state.table.feed(id, self.clock.now())?;
        state.stats.record_feed();
        Ok(())
    }

    /// Pause timeout detection. Deadlines are left as they are.
    ///
    /// A scan already past its locked section still fires what it collected.
    pub fn suspend(&self) {
        {
            let mut state = self.state.lock();
            if !state.initialized {
                return;
            }
            state.enabled = false;
        }
        info!("Watchdog suspended");
    }

    /// Re-arm every active channel from now and re-enable detection.
    ///
    /// Time spent suspended never counts against a channel.
    pub fn resume(&self) {
        {
            let mut state = self.state.lock();
            if !state.initialized {
                return;
            }
            state.table.rearm_all(self.clock.now());
            state.enabled = true;
        }
        info!("Watchdog resumed");
    }

    /// Fire and deactivate every channel whose deadline has passed.
    ///
    /// A no-op when uninitialized or suspended. Expired channels are removed
    /// from the table under the lock; their handlers are then invoked in
    /// index order with the lock released.
    ///
    /// A panicking handler is logged and listed in [`ScanReport::panicked`];
    /// the remaining handlers of the scan still run.
    ///
    /// A channel with no handler is escalated according to the configured
    /// [`MissingHandlerPolicy`]. Under [`MissingHandlerPolicy::Abort`] the
    /// process is aborted.
    pub fn process(&self) -> ScanReport {
        let expired = {
            let mut state = self.state.lock();
            if !state.initialized || !state.enabled {
                return ScanReport::default();
            }
            let expired = state.table.take_expired(self.clock.now());
            let unhandled = expired.iter().filter(|e| e.handler.is_none()).count();
            state.stats.record_scan(expired.len(), unhandled);
            expired
        };

        let mut report = ScanReport::default();
        for channel in expired {
            let id = channel.id;
            error!(channel = %id, "Watchdog channel timeout");
            report.fired.push(id);

            match channel.handler {
                Some(handler) => {
                    let context = channel.context;
                    if panic::catch_unwind(AssertUnwindSafe(|| handler(id, context))).is_err() {
                        error!(channel = %id, "Watchdog timeout handler panicked");
                        report.panicked.push(id);
                    }
                }
                None => self.escalate_unhandled(id, &mut report),
            }
        }
        report
    }

    fn escalate_unhandled(&self, id: ChannelId, report: &mut ScanReport) {
        match self.config.missing_handler_policy {
            MissingHandlerPolicy::Abort => {
                error!(
                    severity = "fatal",
                    channel = %id,
                    "No handler for expired channel, aborting process"
                );
                std::process::abort();
            }
            MissingHandlerPolicy::Report => {
                warn!(channel = %id, "No handler for expired channel");
                report.unhandled.push(id);
            }
        }
    }

    /// Earliest pending deadline, recomputed on every table mutation.
    #[must_use]
    pub fn next_timeout(&self) -> Option<NextTimeout> {
        self.state.lock().table.next_timeout()
    }

    /// Time left until the earliest pending deadline.
    ///
    /// `None` when nothing can fire: no active channel, suspended, or
    /// uninitialized. `Some(Duration::ZERO)` when a deadline has passed.
    #[must_use]
    pub fn time_until_next_timeout(&self) -> Option<Duration> {
        let next = {
            let state = self.state.lock();
            if !state.initialized || !state.enabled {
                return None;
            }
            state.table.next_timeout()?
        };
        let remaining = next.deadline.saturating_duration_since(self.clock.now());
        debug!(channel = %next.channel, remaining_ms = remaining.as_millis(), "Next timeout");
        Some(remaining)
    }

    /// Snapshot of an active channel.
    #[must_use]
    pub fn channel(&self, id: ChannelId) -> Option<ChannelInfo> {
        self.state.lock().table.info(id)
    }

    /// Snapshot of every active channel, in index order.
    #[must_use]
    pub fn channels(&self) -> Vec<ChannelInfo> {
        self.state.lock().table.iter_info().collect()
    }

    /// True if `id` refers to an active channel.
    #[must_use]
    pub fn is_active(&self, id: ChannelId) -> bool {
        self.channel(id).is_some()
    }

    /// Number of active channels.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.state.lock().table.active_count()
    }

    /// Fixed channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// True between `init()` and `cleanup()`.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    /// True if timeout detection is running (initialized and not suspended).
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        let state = self.state.lock();
        state.initialized && state.enabled
    }

    /// Activity counters since the last `init()`.
    #[must_use]
    pub fn stats(&self) -> WatchdogStats {
        let state = self.state.lock();
        WatchdogStats {
            active_channels: state.table.active_count(),
            capacity: state.table.capacity(),
            ..state.stats
        }
    }

    /// The instance configuration.
    #[must_use]
    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    /// The instance time source.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

fn reload_period_ms(reload_period: Duration) -> WatchdogResult<NonZeroU64> {
    let ms = u64::try_from(reload_period.as_millis()).unwrap_or(u64::MAX);
    NonZeroU64::new(ms).ok_or_else(|| {
        WatchdogError::invalid_argument(format!(
            "reload period must be at least 1ms, got {reload_period:?}"
        ))
    })
}

impl<T, C: Clock> std::fmt::Debug for Watchdog<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Watchdog")
            .field("config", &self.config)
            .field("initialized", &state.initialized)
            .field("enabled", &state.enabled)
            .field("active_channels", &state.table.active_count())
            .field("next_timeout", &state.table.next_timeout())
            .finish_non_exhaustive()
    }
}
