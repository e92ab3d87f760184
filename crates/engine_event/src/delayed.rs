//! Timer bookkeeping for events scheduled to fire after a countdown.

use std::collections::VecDeque;

use crate::event::Event;

/// Handle to a scheduled delayed event, usable to cancel it before it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DelayedHandle(u64);

impl DelayedHandle {
    /// Returns the raw identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// An event waiting for its timer to run out.
#[derive(Debug, Clone)]
pub(crate) struct DelayedEvent {
    pub(crate) handle: DelayedHandle,
    pub(crate) event: Event,
    /// Seconds left before the event fires.
    pub(crate) time_remaining: f32,
}

/// Scheduled events in scheduling order.
///
/// Entries whose timer ran out move to a separate elapsed list and stay
/// there until [`pop_elapsed`](DelayedQueue::pop_elapsed) hands them out, so
/// an entry is never lost between the countdown and its delivery.
#[derive(Debug)]
pub(crate) struct DelayedQueue {
    entries: Vec<DelayedEvent>,
    elapsed: VecDeque<DelayedEvent>,
    next_id: u64,
}

impl DelayedQueue {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            elapsed: VecDeque::new(),
            next_id: 1,
        }
    }

    pub(crate) fn schedule(&mut self, delay: f32, event: Event) -> DelayedHandle {
        let handle = DelayedHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(DelayedEvent {
            handle,
            event,
            time_remaining: delay,
        });
        handle
    }

    pub(crate) fn cancel(&mut self, handle: DelayedHandle) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e.handle == handle) {
            self.entries.remove(pos);
            return true;
        }
        match self.elapsed.iter().position(|e| e.handle == handle) {
            Some(pos) => self.elapsed.remove(pos).is_some(),
            None => false,
        }
    }

    /// Count every timer down by `dt` and move the entries that reached zero
    /// to the back of the elapsed list, in scheduling order. Returns how many
    /// entries elapsed.
    pub(crate) fn advance(&mut self, dt: f32) -> usize {
        let before = self.elapsed.len();
        let mut pending = Vec::with_capacity(self.entries.len());
        for mut entry in self.entries.drain(..) {
            entry.time_remaining -= dt;
            if entry.time_remaining <= 0.0 {
                self.elapsed.push_back(entry);
            } else {
                pending.push(entry);
            }
        }
        self.entries = pending;
        self.elapsed.len() - before
    }

    /// Take the oldest elapsed entry that has not been delivered yet.
    pub(crate) fn pop_elapsed(&mut self) -> Option<DelayedEvent> {
        self.elapsed.pop_front()
    }

    pub(crate) fn time_remaining(&self, handle: DelayedHandle) -> Option<f32> {
        self.elapsed
            .iter()
            .chain(&self.entries)
            .find(|e| e.handle == handle)
            .map(|e| e.time_remaining)
    }

    /// Entries still counting down plus elapsed entries not yet delivered.
    pub(crate) fn len(&self) -> usize {
        self.entries.len() + self.elapsed.len()
    }
}
