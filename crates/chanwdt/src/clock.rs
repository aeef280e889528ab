//! Time sources for deadline tracking.
//!
//! The watchdog measures time in [`Tick`]s of one millisecond. A [`Clock`]
//! must be monotonic: a later call never returns a smaller value than an
//! earlier one. Deadline detection has no defense against clock regression.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Absolute point in time, in milliseconds since the clock's origin.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Tick(u64);

impl Tick {
    /// The clock's origin.
    pub const ZERO: Self = Self(0);

    /// Latest representable tick. Deadlines saturate here.
    pub const MAX: Self = Self(u64::MAX);

    /// Create a tick from a millisecond count.
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Millisecond count since the origin.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Add a number of milliseconds, saturating at [`Tick::MAX`].
    #[must_use]
    pub const fn saturating_add_millis(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    /// Time elapsed from `earlier` to `self`, or zero if `earlier` is later.
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Monotonic, non-decreasing time source.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> Tick;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Tick {
        (**self).now()
    }
}

/// Wall-independent clock backed by [`Instant`].
///
/// Ticks count milliseconds since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Tick {
        let ms = self.origin.elapsed().as_millis();
        Tick(u64::try_from(ms).unwrap_or(u64::MAX))
    }
}

/// Manually advanced clock for simulations and deterministic tests.
///
/// Clones share the same underlying time, so a test can keep one handle
/// while the watchdog owns another.
///
/// # Example
///
/// ```rust
/// use chanwdt::{Clock, ManualClock, Tick};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let shared = clock.clone();
/// clock.advance(Duration::from_millis(250));
/// assert_eq!(shared.now(), Tick::from_millis(250));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    ticks: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock starting at [`Tick::ZERO`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at `start`.
    #[must_use]
    pub fn starting_at(start: Tick) -> Self {
        Self {
            ticks: Arc::new(AtomicU64::new(start.as_millis())),
        }
    }

    /// Move time forward by `by`, truncated to whole milliseconds.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        let mut current = self.ticks.load(Ordering::Acquire);
        loop {
            let next = current.saturating_add(ms);
            match self.ticks.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    /// Jump to `tick`. Earlier values are ignored to keep the clock monotonic.
    pub fn set(&self, tick: Tick) {
        self.ticks.fetch_max(tick.as_millis(), Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Tick {
        Tick(self.ticks.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_saturates() {
        assert_eq!(Tick::MAX.saturating_add_millis(10), Tick::MAX);
        assert_eq!(
            Tick::from_millis(5).saturating_duration_since(Tick::from_millis(9)),
            Duration::ZERO
        );
        assert_eq!(
            Tick::from_millis(1500).saturating_duration_since(Tick::from_millis(500)),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_manual_clock_never_goes_back() {
        let clock = ManualClock::starting_at(Tick::from_millis(100));
        clock.set(Tick::from_millis(50));
        assert_eq!(clock.now(), Tick::from_millis(100));

        clock.set(Tick::from_millis(400));
        clock.advance(Duration::from_millis(100));
        assert_eq!(clock.now(), Tick::from_millis(500));
    }

    #[test]
    fn test_monotonic_clock_is_non_decreasing() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        std::thread::sleep(Duration::from_millis(2));
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn test_tick_display() {
        assert_eq!(Tick::from_millis(42).to_string(), "42ms");
    }
}
