//! The game: one event manager and one system manager, advanced together.

#![allow(dead_code)]

use std::rc::Rc;

use anyhow::{Context, Result};
use engine_event::EventManager;
use engine_system::{System, SystemManager};

/// Owns the framework collaborators of a running game.
///
/// One [`Game::update`] is one frame: every system is ticked, then the event
/// queue is drained and delayed events are advanced. Events queued by systems
/// during the frame are therefore delivered within the same frame.
#[derive(Debug)]
pub struct Game {
    events: Rc<EventManager>,
    systems: SystemManager,
}

impl Game {
    /// Create a game without systems or listeners.
    #[must_use]
    pub fn new() -> Self {
        let events = Rc::new(EventManager::new());
        let systems = SystemManager::new(Rc::clone(&events));
        Self { events, systems }
    }

    /// The shared event manager.
    #[must_use]
    pub fn events(&self) -> &Rc<EventManager> {
        &self.events
    }

    /// The system manager.
    #[must_use]
    pub fn systems(&self) -> &SystemManager {
        &self.systems
    }

    /// The system manager, mutably.
    pub fn systems_mut(&mut self) -> &mut SystemManager {
        &mut self.systems
    }

    /// Add a system to be updated every frame.
    ///
    /// # Errors
    ///
    /// Fails if a system of the same type was already added or the system
    /// failed to initialise.
    pub fn add_system<S: System>(&mut self, system: S) -> Result<()> {
        self.systems.add_system(system)?;
        Ok(())
    }

    /// Advance the game by `dt` seconds.
    ///
    /// # Errors
    ///
    /// Fails if a system update or an event listener failed.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        self.systems.update(dt).context("system update failed")?;
        self.events
            .process_events(dt)
            .context("event processing failed")?;
        Ok(())
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
