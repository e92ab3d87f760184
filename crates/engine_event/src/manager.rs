//! The event manager: listener registry, event queues and delayed timers.
//!
//! ## Tick lifecycle
//!
//! Producers call [`EventManager::queue_event`], [`EventManager::fire_immediately`]
//! or [`EventManager::fire_delayed`] at any time. Once per frame the game loop
//! calls [`EventManager::process_events`], which:
//!
//! 1. Moves the intake queue into the in-flight queue and delivers every
//!    in-flight event, repeating until the intake queue stays empty. Events
//!    queued by listeners during delivery are therefore delivered before the
//!    call returns.
//! 2. Returns early if `dt` is not positive.
//! 3. Counts every delayed timer down by `dt` and fires the ones that reached
//!    zero, in scheduling order.
//!
//! All methods take `&self`, so listeners may hold an `Rc<EventManager>` and
//! queue, fire or (un)register from inside a callback. No `RefCell` borrow is
//! held while a listener runs.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::delayed::{DelayedHandle, DelayedQueue};
use crate::error::EventError;
use crate::event::{Event, EventType};
use crate::listener::{Channel, Listener, ListenerRegistry};

/// Allows listeners to register for game events and notifies them whenever
/// one of these events is fired.
///
/// Single-threaded: the manager is neither `Send` nor `Sync`.
pub struct EventManager {
    /// Listener chains per event type, plus the wildcard chain.
    listeners: RefCell<ListenerRegistry>,
    /// Events queued since the last pass.
    new_events: RefCell<Vec<Event>>,
    /// Events of the pass currently being delivered.
    current_events: RefCell<VecDeque<Event>>,
    /// Events to be fired later.
    delayed: RefCell<DelayedQueue>,
    /// Set while `process_events` runs.
    processing: Cell<bool>,
}

impl EventManager {
    /// Create an event manager with empty queues and no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(ListenerRegistry::new()),
            new_events: RefCell::new(Vec::new()),
            current_events: RefCell::new(VecDeque::new()),
            delayed: RefCell::new(DelayedQueue::new()),
            processing: Cell::new(false),
        }
    }

    // ── Producing events ────────────────────────────────────────────────────

    /// Queue an event without payload for the next [`process_events`](Self::process_events).
    pub fn queue_event(&self, event_type: EventType) {
        self.queue(Event::new(event_type));
    }

    /// Queue an event carrying `data` for the next [`process_events`](Self::process_events).
    pub fn queue_event_with<T: 'static>(&self, event_type: EventType, data: T) {
        self.queue(Event::with_data(event_type, data));
    }

    /// Queue the passed event to be processed later.
    pub fn queue(&self, event: Event) {
        trace!(event_type = %event.event_type(), "event queued");
        self.new_events.borrow_mut().push(event);
    }

    /// Deliver an event without payload to all current listeners right away.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ListenerFailed`] if any listener failed.
    pub fn fire_immediately(&self, event_type: EventType) -> Result<(), EventError> {
        self.fire(Event::new(event_type))
    }

    /// Deliver an event carrying `data` to all current listeners right away.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ListenerFailed`] if any listener failed.
    pub fn fire_immediately_with<T: 'static>(
        &self,
        event_type: EventType,
        data: T,
    ) -> Result<(), EventError> {
        self.fire(Event::with_data(event_type, data))
    }

    /// Deliver the passed event to all current listeners right away. The
    /// event queues are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ListenerFailed`] if any listener failed.
    pub fn fire(&self, event: Event) -> Result<(), EventError> {
        self.deliver(&event)
    }

    /// Fire an event without payload once `delay` seconds of tick time have
    /// passed. See [`fire_delayed_event`](Self::fire_delayed_event).
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ListenerFailed`] if `delay <= 0` and a listener
    /// failed.
    pub fn fire_delayed(
        &self,
        delay: f32,
        event_type: EventType,
    ) -> Result<Option<DelayedHandle>, EventError> {
        self.fire_delayed_event(delay, Event::new(event_type))
    }

    /// Fire an event carrying `data` once `delay` seconds of tick time have
    /// passed. See [`fire_delayed_event`](Self::fire_delayed_event).
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ListenerFailed`] if `delay <= 0` and a listener
    /// failed.
    pub fn fire_delayed_with<T: 'static>(
        &self,
        delay: f32,
        event_type: EventType,
        data: T,
    ) -> Result<Option<DelayedHandle>, EventError> {
        self.fire_delayed_event(delay, Event::with_data(event_type, data))
    }

    /// Fire the passed event once `delay` seconds of tick time have passed.
    ///
    /// A positive delay schedules a timer and returns its handle. Any other
    /// delay fires the event immediately and returns `None`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::ListenerFailed`] if the event was fired
    /// immediately and a listener failed.
    pub fn fire_delayed_event(
        &self,
        delay: f32,
        event: Event,
    ) -> Result<Option<DelayedHandle>, EventError> {
        if delay > 0.0 {
            let handle = self.delayed.borrow_mut().schedule(delay, event);
            trace!(delay, handle = handle.id(), "delayed event scheduled");
            Ok(Some(handle))
        } else {
            self.fire(event)?;
            Ok(None)
        }
    }

    /// Cancel a delayed event that has not fired yet.
    ///
    /// Returns `false` if the event already fired or was cancelled before.
    pub fn cancel_delayed(&self, handle: DelayedHandle) -> bool {
        self.delayed.borrow_mut().cancel(handle)
    }

    // ── Listeners ───────────────────────────────────────────────────────────

    /// Register `listener` for events of `event_type`.
    ///
    /// Registering the same listener twice makes it run twice per event.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidArgument`] for [`EventType::INVALID`];
    /// nothing is registered in that case.
    pub fn register_listener(
        &self,
        event_type: EventType,
        listener: &Listener,
    ) -> Result<(), EventError> {
        let channel = Self::channel(event_type)?;
        self.listeners
            .borrow_mut()
            .register(channel, listener.clone());
        Ok(())
    }

    /// Register `listener` for all events.
    ///
    /// A listener that is also registered for a specific type runs twice for
    /// events of that type.
    pub fn register_listener_all(&self, listener: &Listener) {
        self.listeners
            .borrow_mut()
            .register(Channel::All, listener.clone());
    }

    /// Wrap `callback` in a [`Listener`], register it for `event_type` and
    /// return the handle for later removal.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidArgument`] for [`EventType::INVALID`].
    pub fn listen<F>(&self, event_type: EventType, callback: F) -> Result<Listener, EventError>
    where
        F: Fn(&Event) -> anyhow::Result<()> + 'static,
    {
        let listener = Listener::new(callback);
        self.register_listener(event_type, &listener)?;
        Ok(listener)
    }

    /// Remove one registration of `listener` for `event_type`. Removing a
    /// listener that is not registered does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidArgument`] for [`EventType::INVALID`].
    pub fn remove_listener(
        &self,
        event_type: EventType,
        listener: &Listener,
    ) -> Result<(), EventError> {
        let channel = Self::channel(event_type)?;
        self.listeners.borrow_mut().remove(channel, listener);
        Ok(())
    }

    /// Remove one registration of `listener` from the all-events chain.
    /// Registrations for specific event types are left alone.
    pub fn remove_listener_all(&self, listener: &Listener) {
        self.listeners.borrow_mut().remove(Channel::All, listener);
    }

    fn channel(event_type: EventType) -> Result<Channel, EventError> {
        if event_type.is_valid() {
            Ok(Channel::Type(event_type))
        } else {
            Err(EventError::InvalidArgument { name: "event_type" })
        }
    }

    // ── Processing ──────────────────────────────────────────────────────────

    /// Deliver all queued events, then advance delayed timers by `dt` seconds
    /// and fire the ones that elapsed.
    ///
    /// A `dt` that is not positive only drains the queues; delayed timers are
    /// left untouched.
    ///
    /// Events are taken off the queues one at a time, so a listener that fails
    /// or panics only costs the event being delivered. In-flight events left
    /// behind are delivered first by the next call, and elapsed delayed
    /// events left behind fire on the next call with a positive `dt`.
    ///
    /// # Errors
    ///
    /// - [`EventError::Reentrant`] if called from a listener run by
    ///   `process_events`. Nothing is processed.
    /// - [`EventError::ListenerFailed`] if listeners of an event failed.
    ///   Processing stops after that event.
    pub fn process_events(&self, dt: f32) -> Result<(), EventError> {
        if self.processing.get() {
            return Err(EventError::Reentrant);
        }
        let _guard = ProcessingGuard::enter(&self.processing);

        let mut passes = 0usize;
        let mut delivered = 0usize;

        loop {
            let next = self.current_events.borrow_mut().pop_front();
            let event = match next {
                Some(event) => event,
                None => {
                    let batch = std::mem::take(&mut *self.new_events.borrow_mut());
                    if batch.is_empty() {
                        break;
                    }
                    passes += 1;
                    self.current_events.borrow_mut().extend(batch);
                    continue;
                }
            };
            delivered += 1;
            self.deliver(&event)?;
        }

        if dt.is_nan() || dt <= 0.0 {
            debug!(passes, delivered, "processed events");
            return Ok(());
        }

        let elapsed = self.delayed.borrow_mut().advance(dt);
        let mut fired = 0usize;
        loop {
            let next = self.delayed.borrow_mut().pop_elapsed();
            let Some(entry) = next else {
                break;
            };
            trace!(handle = entry.handle.id(), "delayed event elapsed");
            fired += 1;
            self.deliver(&entry.event)?;
        }

        debug!(
            passes,
            delivered,
            delayed_elapsed = elapsed,
            delayed_fired = fired,
            dt,
            "processed events"
        );
        Ok(())
    }

    /// Deliver queued events without advancing delayed timers.
    ///
    /// # Errors
    ///
    /// See [`process_events`](Self::process_events).
    pub fn flush(&self) -> Result<(), EventError> {
        self.process_events(0.0)
    }

    /// Notify every interested listener of `event`: the type chain first,
    /// then the wildcard chain. All of them run even if some fail.
    fn deliver(&self, event: &Event) -> Result<(), EventError> {
        let event_type = event.event_type();
        let recipients = self.listeners.borrow().recipients(event_type);
        if recipients.is_empty() {
            trace!(event_type = %event_type, "event had no listeners");
            return Ok(());
        }

        trace!(event_type = %event_type, listeners = recipients.len(), "delivering event");

        let mut failures = Vec::new();
        for listener in &recipients {
            if let Err(err) = listener.call(event) {
                warn!(event_type = %event_type, error = %err, "listener failed");
                failures.push(err);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(EventError::ListenerFailed {
                event_type,
                failures,
            })
        }
    }

    // ── Introspection ───────────────────────────────────────────────────────

    /// Number of events waiting in the intake and in-flight queues.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.current_events.borrow().len() + self.new_events.borrow().len()
    }

    /// Number of delayed events not delivered yet, including elapsed ones
    /// left behind by a failed call.
    #[must_use]
    pub fn delayed_count(&self) -> usize {
        self.delayed.borrow().len()
    }

    /// Seconds left on a delayed event, or `None` if it was delivered or
    /// cancelled.
    #[must_use]
    pub fn delayed_time_remaining(&self, handle: DelayedHandle) -> Option<f32> {
        self.delayed.borrow().time_remaining(handle)
    }

    /// Total number of successful listener registrations so far.
    #[must_use]
    pub fn registered_listeners(&self) -> usize {
        self.listeners.borrow().registered()
    }

    /// Number of listeners currently registered for `event_type`, not
    /// counting wildcard listeners.
    #[must_use]
    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.listeners
            .borrow()
            .chain_len(Channel::Type(event_type))
    }

    /// Number of listeners currently registered for all events.
    #[must_use]
    pub fn wildcard_listener_count(&self) -> usize {
        self.listeners.borrow().chain_len(Channel::All)
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("queued", &self.event_count())
            .field("delayed", &self.delayed_count())
            .field("registered_listeners", &self.registered_listeners())
            .field("processing", &self.processing.get())
            .finish()
    }
}

/// Clears the processing flag when `process_events` returns or unwinds.
struct ProcessingGuard<'a>(&'a Cell<bool>);

impl<'a> ProcessingGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
