//! # engine_system
//!
//! The system registry of the game framework. Every game system implements
//! [`System`] and is added to a [`SystemManager`], which ticks all of them once
//! per frame in the order they were added.
//!
//! The manager is coupled to the rest of the framework only through the
//! shared [`EventManager`](engine_event::EventManager): adding or removing a
//! system queues a framework event.
//!
//! ## Usage
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use engine_event::EventManager;
//! use engine_system::{System, SystemManager};
//!
//! struct Gravity;
//!
//! impl System for Gravity {
//!     fn update_system(&mut self, _dt: f32) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let events = Rc::new(EventManager::new());
//! let mut systems = SystemManager::new(Rc::clone(&events));
//! systems.add_system(Gravity).unwrap();
//! systems.update(1.0 / 60.0).unwrap();
//! assert!(systems.contains::<Gravity>());
//! ```

pub mod error;
pub mod manager;
pub mod system;

pub use error::SystemError;
pub use manager::SystemManager;
pub use system::System;
