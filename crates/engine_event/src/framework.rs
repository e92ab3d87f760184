//! Event types raised by the framework itself.
//!
//! All framework event names are prefixed with `engine.` so game code can use
//! any other prefix without colliding.

use crate::event::EventType;

/// Root prefix for all framework event names.
pub const PREFIX: &str = "engine";

// ── System lifecycle ────────────────────────────────────────────────────────

/// A system was added to the system manager. Payload: [`SystemEventData`].
pub const SYSTEM_ADDED: EventType = EventType::from_name("engine.system.added");

/// A system was removed from the system manager. Payload: [`SystemEventData`].
pub const SYSTEM_REMOVED: EventType = EventType::from_name("engine.system.removed");

/// Payload of the system lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEventData {
    /// Name of the system that was added or removed.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_event_types_are_distinct() {
        assert_ne!(SYSTEM_ADDED, SYSTEM_REMOVED);
        assert!(SYSTEM_ADDED.is_valid());
        assert!(SYSTEM_REMOVED.is_valid());
    }

    #[test]
    fn test_framework_event_types_match_names() {
        assert_eq!(SYSTEM_ADDED, EventType::from_name(&format!("{PREFIX}.system.added")));
    }
}
