//! Dispatcher error types.

use crate::event::EventType;

/// Errors raised by the [`EventManager`](crate::EventManager).
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// A required argument was absent (e.g. [`EventType::INVALID`]).
    /// The call had no effect.
    #[error("invalid argument: {name}")]
    InvalidArgument {
        /// Name of the offending parameter.
        name: &'static str,
    },

    /// One or more listeners failed while an event was being delivered.
    ///
    /// Every listener of the event was still invoked; this carries all of
    /// their failures in invocation order.
    #[error("{} listener(s) failed while handling {event_type}", .failures.len())]
    ListenerFailed {
        /// Type of the event being delivered.
        event_type: EventType,
        /// The listener failures.
        failures: Vec<anyhow::Error>,
    },

    /// `process_events` was called from inside a listener that is itself
    /// being run by `process_events`.
    #[error("process_events called re-entrantly from a listener")]
    Reentrant,
}

impl EventError {
    /// Returns the listener failures if this is a [`EventError::ListenerFailed`].
    #[must_use]
    pub fn failures(&self) -> &[anyhow::Error] {
        match self {
            Self::ListenerFailed { failures, .. } => failures,
            _ => &[],
        }
    }
}
