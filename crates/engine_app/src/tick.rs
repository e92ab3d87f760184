//! Fixed-timestep tick loop.
//!
//! Each tick:
//!
//! 1. Advance the tick counter.
//! 2. Update every system in registration order.
//! 3. Drain the event queue, including events queued during step 2.
//! 4. Advance delayed events by the tick duration and fire the elapsed ones.

use std::time::{Duration, Instant};

use anyhow::{Result, ensure};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::game::Game;

/// Configuration for the tick loop.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl TickConfig {
    /// Reject tick rates the loop cannot run at.
    ///
    /// # Errors
    ///
    /// Fails if `tick_rate` is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.tick_rate.is_finite() && self.tick_rate > 0.0,
            "tick_rate must be a positive number, got {}",
            self.tick_rate
        );
        Ok(())
    }

    /// Duration of a single tick.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate)
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

/// Drives a [`Game`] at a fixed rate.
#[derive(Debug)]
pub struct TickLoop {
    /// Current tick counter.
    tick_id: u64,
    /// Tick configuration.
    config: TickConfig,
    /// The game being driven.
    game: Game,
}

impl TickLoop {
    /// Create a tick loop for `game`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid.
    pub fn new(config: TickConfig, game: Game) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tick_id: 0,
            config,
            game,
        })
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Returns a reference to the game.
    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Run one tick of `dt` seconds.
    ///
    /// # Errors
    ///
    /// Fails if a system or an event listener failed.
    pub fn tick(&mut self, dt: f64) -> Result<()> {
        self.tick_id += 1;

        debug!(
            tick_id = self.tick_id,
            dt,
            queued = self.game.events().event_count(),
            delayed = self.game.events().delayed_count(),
            "tick start"
        );

        self.game.update(dt as f32)
    }

    /// Run the tick loop for the configured number of ticks, or until a tick
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns the first tick failure.
    pub fn run(&mut self) -> Result<()> {
        let budget = self.config.tick_duration();
        let dt = budget.as_secs_f64();
        let last_tick = match self.config.max_ticks {
            0 => None,
            n => Some(self.tick_id + n),
        };

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            systems = self.game.systems().len(),
            "starting tick loop"
        );

        loop {
            let started = Instant::now();
            self.tick(dt)?;

            if last_tick.is_some_and(|last| self.tick_id >= last) {
                info!(tick_id = self.tick_id, "tick loop finished");
                return Ok(());
            }

            self.wait_for_next_tick(started.elapsed(), budget);
        }
    }

    /// Sleep away what is left of the tick budget, or report the overrun.
    fn wait_for_next_tick(&self, spent: Duration, budget: Duration) {
        match budget.checked_sub(spent) {
            Some(rest) => std::thread::sleep(rest),
            None => warn!(
                tick_id = self.tick_id,
                spent_ms = spent.as_millis() as u64,
                budget_ms = budget.as_millis() as u64,
                "tick overran its budget"
            ),
        }
    }
}
