//! Fixed-capacity channel table.
//!
//! The table is a bounded arena allocated once at construction. Slots are
//! handed out first-fit, lowest index first, so a freed slot is the next one
//! reused. The table holds no lock; [`Watchdog`](crate::Watchdog) guards it.

use std::num::NonZeroU64;

use crate::channel::{Channel, ChannelId, ChannelInfo, Expired, NextTimeout, TimeoutHandler};
use crate::clock::Tick;
use crate::error::{WatchdogError, WatchdogResult};

pub(crate) struct ChannelTable<T> {
    slots: Box<[Option<Channel<T>>]>,
    active: usize,
    next: Option<NextTimeout>,
}

impl<T> ChannelTable<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
            active: 0,
            next: None,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn active_count(&self) -> usize {
        self.active
    }

    pub(crate) fn next_timeout(&self) -> Option<NextTimeout> {
        self.next
    }

    /// Register a channel in the lowest free slot, armed relative to `now`.
    pub(crate) fn allocate(
        &mut self,
        reload_period_ms: NonZeroU64,
        handler: Option<TimeoutHandler<T>>,
        context: T,
        now: Tick,
    ) -> WatchdogResult<ChannelId> {
        let capacity = self.capacity();
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())
            .ok_or(WatchdogError::CapacityExceeded { capacity })?;

        *slot = Some(Channel::armed(reload_period_ms, handler, context, now));
        self.active = self.active.saturating_add(1);
        self.recompute_next();
        Ok(ChannelId::from_index(index))
    }

    /// Clear an active slot, dropping its handler and context.
    pub(crate) fn release(&mut self, id: ChannelId) -> WatchdogResult<()> {
        let slot = self
            .slots
            .get_mut(id.index())
            .ok_or(WatchdogError::InvalidHandle(id))?;
        if slot.take().is_none() {
            return Err(WatchdogError::InvalidHandle(id));
        }
        self.active = self.active.saturating_sub(1);
        self.recompute_next();
        Ok(())
    }

    pub(crate) fn feed(&mut self, id: ChannelId, now: Tick) -> WatchdogResult<()> {
        let channel = self
            .slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(WatchdogError::InvalidHandle(id))?;
        channel.rearm(now);
        self.recompute_next();
        Ok(())
    }

    /// Re-arm every active channel relative to `now`.
    pub(crate) fn rearm_all(&mut self, now: Tick) {
        for channel in self.slots.iter_mut().flatten() {
            channel.rearm(now);
        }
        self.recompute_next();
    }

    /// Remove every channel whose deadline is at or before `now`.
    ///
    /// Returned in index order. The removed slots are free again.
    pub(crate) fn take_expired(&mut self, now: Tick) -> Vec<Expired<T>> {
        let mut expired = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.as_ref().is_some_and(|channel| channel.is_expired(now)) {
                continue;
            }
            if let Some(channel) = slot.take() {
                expired.push(Expired {
                    id: ChannelId::from_index(index),
                    handler: channel.handler,
                    context: channel.context,
                });
            }
        }
        if !expired.is_empty() {
            self.active = self.active.saturating_sub(expired.len());
            self.recompute_next();
        }
        expired
    }

    pub(crate) fn info(&self, id: ChannelId) -> Option<ChannelInfo> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .map(|channel| ChannelInfo::of(id, channel))
    }

    pub(crate) fn iter_info(&self) -> impl Iterator<Item = ChannelInfo> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|channel| ChannelInfo::of(ChannelId::from_index(index), channel))
        })
    }

    /// Deactivate every channel.
    pub(crate) fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.active = 0;
        self.next = None;
    }

    fn recompute_next(&mut self) {
        let mut next: Option<NextTimeout> = None;
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(channel) = slot else { continue };
            if next.is_none_or(|current| channel.deadline < current.deadline) {
                next = Some(NextTimeout {
                    channel: ChannelId::from_index(index),
                    deadline: channel.deadline,
                });
            }
        }
        self.next = next;
    }
}
