//! Built-in systems run by the engine binary.
//!
//! They talk to each other only through events: the heartbeat system queues
//! [`HEARTBEAT`] at a fixed interval, the alarm system answers every heartbeat
//! with a delayed [`ALARM`], and the event log system counts everything it
//! sees through a wildcard listener.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::{Rc, Weak};

use anyhow::Context;
use engine_event::{EventManager, EventType, Listener};
use engine_system::System;
use tracing::{debug, info};

/// Queued every heartbeat interval. Payload: the beat number (`u64`).
pub const HEARTBEAT: EventType = EventType::from_name("game.heartbeat");

/// Fired a fixed delay after each heartbeat. Payload: the beat number (`u64`).
pub const ALARM: EventType = EventType::from_name("game.alarm");

/// Queues a [`HEARTBEAT`] every `interval` seconds of game time.
#[derive(Debug)]
pub struct HeartbeatSystem {
    interval: f32,
    elapsed: f32,
    beats: u64,
    events: Option<Rc<EventManager>>,
}

impl HeartbeatSystem {
    #[must_use]
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            elapsed: 0.0,
            beats: 0,
            events: None,
        }
    }

    /// Number of heartbeats queued so far.
    #[must_use]
    pub fn beats(&self) -> u64 {
        self.beats
    }
}

impl System for HeartbeatSystem {
    fn update_system(&mut self, dt: f32) -> anyhow::Result<()> {
        let events = self
            .events
            .as_ref()
            .context("heartbeat system was not initialised")?;

        self.elapsed += dt;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            self.beats += 1;
            events.queue_event_with(HEARTBEAT, self.beats);
        }
        Ok(())
    }

    fn init(&mut self, events: &Rc<EventManager>) -> anyhow::Result<()> {
        anyhow::ensure!(self.interval > 0.0, "heartbeat interval must be positive");
        self.events = Some(Rc::clone(events));
        Ok(())
    }

    fn name(&self) -> &str {
        "heartbeat"
    }
}

/// Schedules an [`ALARM`] `delay` seconds after every heartbeat and counts
/// the alarms that went off.
#[derive(Debug)]
pub struct AlarmSystem {
    delay: f32,
    fired: Rc<Cell<u64>>,
}

impl AlarmSystem {
    #[must_use]
    pub fn new(delay: f32) -> Self {
        Self {
            delay,
            fired: Rc::new(Cell::new(0)),
        }
    }

    /// Number of alarms that went off so far.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.fired.get()
    }
}

impl System for AlarmSystem {
    fn update_system(&mut self, _dt: f32) -> anyhow::Result<()> {
        Ok(())
    }

    fn init(&mut self, events: &Rc<EventManager>) -> anyhow::Result<()> {
        // Weak, so the manager does not keep itself alive through its own
        // listener chain.
        let weak: Weak<EventManager> = Rc::downgrade(events);
        let delay = self.delay;
        events.listen(HEARTBEAT, move |e| {
            let beat = e.data::<u64>().copied().unwrap_or_default();
            if let Some(events) = weak.upgrade() {
                events.fire_delayed_with(delay, ALARM, beat)?;
            }
            Ok(())
        })?;

        let fired = Rc::clone(&self.fired);
        events.listen(ALARM, move |e| {
            fired.set(fired.get() + 1);
            info!(beat = e.data::<u64>().copied(), "alarm");
            Ok(())
        })?;
        Ok(())
    }

    fn name(&self) -> &str {
        "alarm"
    }
}

/// Logs and counts every delivered event.
#[derive(Debug, Default)]
pub struct EventLogSystem {
    seen: Rc<Cell<u64>>,
    listener: Option<Listener>,
}

impl EventLogSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events delivered since the system was added.
    #[must_use]
    pub fn seen(&self) -> u64 {
        self.seen.get()
    }

    /// Stop logging. Returns `false` if the system was never initialised.
    pub fn detach(&mut self, events: &EventManager) -> bool {
        match self.listener.take() {
            Some(listener) => {
                events.remove_listener_all(&listener);
                true
            }
            None => false,
        }
    }
}

impl System for EventLogSystem {
    fn update_system(&mut self, _dt: f32) -> anyhow::Result<()> {
        Ok(())
    }

    fn init(&mut self, events: &Rc<EventManager>) -> anyhow::Result<()> {
        let seen = Rc::clone(&self.seen);
        let listener = Listener::new(move |e| {
            seen.set(seen.get() + 1);
            debug!(event_type = %e.event_type(), has_data = e.has_data(), "event");
            Ok(())
        });
        events.register_listener_all(&listener);
        self.listener = Some(listener);
        Ok(())
    }

    fn name(&self) -> &str {
        "event_log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;

    fn game(interval: f32, delay: f32) -> Game {
        let mut game = Game::new();
        game.add_system(HeartbeatSystem::new(interval)).unwrap();
        game.add_system(AlarmSystem::new(delay)).unwrap();
        game.add_system(EventLogSystem::new()).unwrap();
        game
    }

    #[test]
    fn test_heartbeat_interval() {
        let mut game = game(1.0, 0.5);
        for _ in 0..10 {
            game.update(0.25).unwrap();
        }
        let heartbeat = game.systems().get_system::<HeartbeatSystem>().unwrap();
        assert_eq!(heartbeat.beats(), 2);
    }

    #[test]
    fn test_alarm_follows_heartbeat_after_delay() {
        let mut game = game(1.0, 0.5);

        // Heartbeat on the fourth tick. The alarm scheduled from it is
        // already counted down by that tick's dt.
        for _ in 0..4 {
            game.update(0.25).unwrap();
        }
        assert_eq!(game.systems().get_system::<AlarmSystem>().unwrap().fired(), 0);
        assert_eq!(game.events().delayed_count(), 1);

        game.update(0.25).unwrap();
        assert_eq!(game.systems().get_system::<AlarmSystem>().unwrap().fired(), 1);
        assert_eq!(game.events().delayed_count(), 0);
    }

    #[test]
    fn test_zero_delay_alarm_fires_with_heartbeat() {
        let mut game = game(0.5, 0.0);
        game.update(0.5).unwrap();
        assert_eq!(game.systems().get_system::<AlarmSystem>().unwrap().fired(), 1);
        assert_eq!(game.events().delayed_count(), 0);
    }

    #[test]
    fn test_event_log_sees_everything() {
        let mut game = game(0.5, 0.0);
        // Three SYSTEM_ADDED events, then one heartbeat and its alarm.
        game.update(0.5).unwrap();
        let log = game.systems().get_system::<EventLogSystem>().unwrap();
        assert_eq!(log.seen(), 5);
    }

    #[test]
    fn test_event_log_detach() {
        let mut game = game(0.5, 0.0);
        let events = Rc::clone(game.events());
        let log = game.systems_mut().get_system_mut::<EventLogSystem>().unwrap();
        assert!(log.detach(&events));
        assert!(!log.detach(&events));

        game.update(0.5).unwrap();
        let log = game.systems().get_system::<EventLogSystem>().unwrap();
        assert_eq!(log.seen(), 0);
    }

    #[test]
    fn test_heartbeat_requires_positive_interval() {
        let mut game = Game::new();
        assert!(game.add_system(HeartbeatSystem::new(0.0)).is_err());
    }
}
