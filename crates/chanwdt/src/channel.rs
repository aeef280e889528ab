//! Channel records and handles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;
use std::time::Duration;

use crate::clock::Tick;

/// Handler invoked once when a channel expires.
///
/// Receives the channel id and takes back ownership of the context that was
/// registered with the channel.
pub type TimeoutHandler<T> = Box<dyn FnOnce(ChannelId, T) + Send + 'static>;

/// Opaque handle to a channel slot.
///
/// Handles are slot indices. A slot is reused by a later `add` once its
/// channel has been deleted or has fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(usize);

impl ChannelId {
    /// Wrap a raw slot index.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Raw slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An active channel. Inactive slots hold no record at all.
pub(crate) struct Channel<T> {
    pub(crate) reload_period_ms: NonZeroU64,
    pub(crate) deadline: Tick,
    pub(crate) handler: Option<TimeoutHandler<T>>,
    pub(crate) context: T,
}

impl<T> Channel<T> {
    pub(crate) fn armed(
        reload_period_ms: NonZeroU64,
        handler: Option<TimeoutHandler<T>>,
        context: T,
        now: Tick,
    ) -> Self {
        Self {
            reload_period_ms,
            deadline: now.saturating_add_millis(reload_period_ms.get()),
            handler,
            context,
        }
    }

    /// Push the deadline one reload period past `now`.
    #[inline]
    pub(crate) fn rearm(&mut self, now: Tick) {
        self.deadline = now.saturating_add_millis(self.reload_period_ms.get());
    }

    pub(crate) fn is_expired(&self, now: Tick) -> bool {
        self.deadline <= now
    }
}

/// A channel taken out of the table by the scanner.
pub(crate) struct Expired<T> {
    pub(crate) id: ChannelId,
    pub(crate) handler: Option<TimeoutHandler<T>>,
    pub(crate) context: T,
}

/// Read-only snapshot of an active channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    /// Slot handle.
    pub id: ChannelId,
    /// Required maximum interval between feeds.
    pub reload_period: Duration,
    /// Absolute time at which the channel expires absent a feed.
    pub deadline: Tick,
    /// Whether a timeout handler is bound.
    pub has_handler: bool,
}

impl ChannelInfo {
    pub(crate) fn of<T>(id: ChannelId, channel: &Channel<T>) -> Self {
        Self {
            id,
            reload_period: Duration::from_millis(channel.reload_period_ms.get()),
            deadline: channel.deadline,
            has_handler: channel.handler.is_some(),
        }
    }
}

/// Earliest pending deadline across all active channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NextTimeout {
    /// Channel that expires first. Ties resolve to the lowest id.
    pub channel: ChannelId,
    /// Its deadline.
    pub deadline: Tick,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armed_channel_deadline() {
        let period = NonZeroU64::MIN.saturating_add(99);
        let channel: Channel<()> = Channel::armed(period, None, (), Tick::from_millis(50));
        assert_eq!(channel.deadline, Tick::from_millis(150));
        assert!(!channel.is_expired(Tick::from_millis(149)));
        assert!(channel.is_expired(Tick::from_millis(150)));
    }

    #[test]
    fn test_rearm_saturates() {
        let period = NonZeroU64::MIN.saturating_add(9);
        let mut channel: Channel<()> = Channel::armed(period, None, (), Tick::ZERO);
        channel.rearm(Tick::MAX);
        assert_eq!(channel.deadline, Tick::MAX);
    }

    #[test]
    fn test_channel_info_snapshot() {
        let period = NonZeroU64::MIN.saturating_add(999);
        let handler: TimeoutHandler<u8> = Box::new(|_, _| {});
        let channel = Channel::armed(period, Some(handler), 3u8, Tick::ZERO);
        let info = ChannelInfo::of(ChannelId::from_index(2), &channel);
        assert_eq!(info.reload_period, Duration::from_secs(1));
        assert_eq!(info.deadline, Tick::from_millis(1000));
        assert!(info.has_handler);
    }
}
