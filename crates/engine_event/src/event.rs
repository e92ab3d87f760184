//! Event identity and the [`Event`] value broadcast through the dispatcher.
//!
//! ## Event Type Identity
//!
//! [`EventType`] is derived from the event's **string name** using the FNV-1a
//! 64-bit hash algorithm. Any module can mint a new event type without
//! touching the dispatcher, and two modules that hash the same name talk on
//! the same channel. Routing compares the `u64` value and nothing else.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A unique identifier for an event channel, derived from its string name
/// using the FNV-1a 64-bit hash algorithm.
///
/// Equality of the wrapped value *is* the routing contract: two
/// `EventType`s that compare equal are the same channel, no matter where they
/// were constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventType(pub u64);

impl EventType {
    /// The absent / invalid event type sentinel. Rejected by every
    /// registration API.
    pub const INVALID: EventType = EventType(0);

    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`EventType`] for an event name using FNV-1a 64-bit.
    ///
    /// This is the canonical way to declare an event type, and it is `const`
    /// so event types can live in `const` items:
    ///
    /// ```rust
    /// use engine_event::EventType;
    ///
    /// const PLAYER_DIED: EventType = EventType::from_name("game.player.died");
    /// assert_eq!(PLAYER_DIED, EventType::from_name("game.player.died"));
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Create an event type from a raw `u64` identifier.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Returns `true` unless this is [`EventType::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({:#018x})", self.0)
    }
}

/// An immutable `(type, payload)` pair broadcast through the dispatcher.
///
/// The payload is reference counted, so cloning an event (which the
/// dispatcher does when it hands the same event to several listeners or moves
/// it between queues) never copies the data.
#[derive(Clone)]
pub struct Event {
    event_type: EventType,
    payload: Option<Rc<dyn Any>>,
}

impl Event {
    /// Create an event without a payload.
    #[must_use]
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            payload: None,
        }
    }

    /// Create an event carrying `data`.
    #[must_use]
    pub fn with_data<T: Any>(event_type: EventType, data: T) -> Self {
        Self {
            event_type,
            payload: Some(Rc::new(data)),
        }
    }

    /// Create an event from an already shared payload, if any.
    #[must_use]
    pub fn with_payload(event_type: EventType, payload: Option<Rc<dyn Any>>) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    /// The channel this event is routed on.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// The raw payload, if the event carries one.
    #[must_use]
    pub fn payload(&self) -> Option<&Rc<dyn Any>> {
        self.payload.as_ref()
    }

    /// Returns `true` if the event carries a payload.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.payload.is_some()
    }

    /// Borrow the payload as a `T`.
    ///
    /// Returns `None` if there is no payload or it is of another type.
    #[must_use]
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("event_type", &self.event_type)
            .field("has_data", &self.has_data())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_from_name_is_deterministic() {
        let id = EventType::from_name("game.player.died");
        assert_eq!(id, EventType::from_name("game.player.died"));
        assert_ne!(id, EventType::from_name("game.player.spawned"));
    }

    #[test]
    fn test_fnv1a_known_vector() {
        // FNV-1a 64-bit of the empty string is the offset basis itself.
        assert_eq!(
            EventType::from_name(""),
            EventType(0xcbf2_9ce4_8422_2325)
        );
        assert_eq!(EventType::from_name("a"), EventType(0xaf63_dc4c_8601_ec8c));
    }

    #[test]
    fn test_equal_values_are_the_same_channel() {
        let a = EventType::from_raw(7);
        let b = EventType(7);
        assert_eq!(a, b);

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_invalid_sentinel() {
        assert!(!EventType::INVALID.is_valid());
        assert!(EventType::from_name("x").is_valid());
    }

    #[test]
    fn test_event_data_downcast() {
        let ty = EventType::from_name("score");
        let e = Event::with_data(ty, 42u32);
        assert_eq!(e.event_type(), ty);
        assert_eq!(e.data::<u32>(), Some(&42));
        assert_eq!(e.data::<String>(), None);

        let empty = Event::new(ty);
        assert!(!empty.has_data());
        assert_eq!(empty.data::<u32>(), None);
    }

    #[test]
    fn test_clone_shares_payload() {
        let e = Event::with_data(EventType(1), String::from("payload"));
        let copy = e.clone();
        let (Some(a), Some(b)) = (e.payload(), copy.payload()) else {
            panic!("payload missing");
        };
        assert!(Rc::ptr_eq(a, b));
    }
}
