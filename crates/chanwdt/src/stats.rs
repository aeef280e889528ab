//! Watchdog activity counters.

use serde::{Deserialize, Serialize};

/// Snapshot of watchdog activity since the last `init()`.
///
/// Counters saturate instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogStats {
    /// Channels successfully registered.
    pub channels_added: u64,
    /// Channels explicitly deleted.
    pub channels_deleted: u64,
    /// Successful feeds.
    pub feeds: u64,
    /// Channels that expired and were fired.
    pub timeouts: u64,
    /// Expired channels that had no handler bound.
    pub unhandled_timeouts: u64,
    /// Scans performed while initialized and enabled.
    pub scans: u64,
    /// Currently active channels.
    pub active_channels: usize,
    /// Fixed channel capacity.
    pub capacity: usize,
}

impl WatchdogStats {
    pub(crate) fn record_add(&mut self) {
        self.channels_added = self.channels_added.saturating_add(1);
    }

    pub(crate) fn record_delete(&mut self) {
        self.channels_deleted = self.channels_deleted.saturating_add(1);
    }

    #[inline]
    pub(crate) fn record_feed(&mut self) {
        self.feeds = self.feeds.saturating_add(1);
    }

    pub(crate) fn record_scan(&mut self, fired: usize, unhandled: usize) {
        self.scans = self.scans.saturating_add(1);
        self.timeouts = self
            .timeouts
            .saturating_add(u64::try_from(fired).unwrap_or(u64::MAX));
        self.unhandled_timeouts = self
            .unhandled_timeouts
            .saturating_add(u64::try_from(unhandled).unwrap_or(u64::MAX));
    }

    /// Fraction of registered channels that ended by firing, as a percentage.
    ///
    /// Returns 0.0 if no channel has been registered.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "counters stay far below 2^52 in practice"
    )]
    pub fn timeout_rate(&self) -> f64 {
        if self.channels_added == 0 {
            0.0
        } else {
            (self.timeouts as f64 / self.channels_added as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_scan_accumulates() {
        let mut stats = WatchdogStats::default();
        stats.record_scan(0, 0);
        stats.record_scan(2, 1);
        assert_eq!(stats.scans, 2);
        assert_eq!(stats.timeouts, 2);
        assert_eq!(stats.unhandled_timeouts, 1);
    }

    #[test]
    fn test_timeout_rate() {
        let mut stats = WatchdogStats::default();
        assert!(stats.timeout_rate().abs() < f64::EPSILON);

        for _ in 0..4 {
            stats.record_add();
        }
        stats.record_scan(1, 0);
        assert!((stats.timeout_rate() - 25.0).abs() < 0.001);
    }

    #[test]
    fn test_counters_saturate() {
        let mut stats = WatchdogStats {
            feeds: u64::MAX,
            ..Default::default()
        };
        stats.record_feed();
        assert_eq!(stats.feeds, u64::MAX);
    }
}
