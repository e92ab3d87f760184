//! # engine_event
//!
//! Tick-synchronized event dispatch for the game framework. Decoupled systems
//! talk to each other by firing typed events through an [`EventManager`]
//! instead of calling each other.
//!
//! This crate provides:
//!
//! - [`EventType`] — FNV-1a hashed event channel identity.
//! - [`Event`] — an immutable `(type, payload)` pair.
//! - [`Listener`] — a cloneable callback handle, compared by identity.
//! - [`EventManager`] — queued, immediate and delayed delivery.
//! - [`framework`] — event types raised by the framework itself.
//!
//! ## Usage
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use engine_event::{EventManager, EventType};
//!
//! const SCORED: EventType = EventType::from_name("game.scored");
//!
//! let events = EventManager::new();
//! let total = Rc::new(Cell::new(0));
//! let sink = Rc::clone(&total);
//! events
//!     .listen(SCORED, move |e| {
//!         sink.set(sink.get() + e.data::<u32>().copied().unwrap_or(0));
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! events.queue_event_with(SCORED, 10u32);
//! events.fire_delayed_with(1.5, SCORED, 5u32).unwrap();
//! assert_eq!(total.get(), 0);
//!
//! events.process_events(1.0).unwrap();
//! assert_eq!(total.get(), 10);
//! events.process_events(1.0).unwrap();
//! assert_eq!(total.get(), 15);
//! ```

pub mod delayed;
pub mod error;
pub mod event;
pub mod framework;
pub mod listener;
pub mod manager;

pub use delayed::DelayedHandle;
pub use error::EventError;
pub use event::{Event, EventType};
pub use listener::{Listener, ListenerFn};
pub use manager::EventManager;
