//! System manager — the registry of systems ticked once per frame.
//!
//! Systems are keyed by their concrete Rust type and updated in the order
//! they were added. The manager never calls other collaborators directly:
//! adding or removing a system is announced by queueing a framework event on
//! the shared [`EventManager`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{info, trace};

use engine_event::EventManager;
use engine_event::framework::{SYSTEM_ADDED, SYSTEM_REMOVED, SystemEventData};

use crate::error::SystemError;
use crate::system::System;

/// A registered system and its identity.
struct SystemEntry {
    type_id: TypeId,
    system: Box<dyn System>,
}

/// Manages the game systems to be updated in each tick.
pub struct SystemManager {
    /// Event manager lifecycle events are queued on.
    events: Rc<EventManager>,
    /// Systems in registration order.
    systems: Vec<SystemEntry>,
    /// Position of each system in `systems`, by type.
    index: HashMap<TypeId, usize>,
}

impl SystemManager {
    /// Create a manager without any systems.
    #[must_use]
    pub fn new(events: Rc<EventManager>) -> Self {
        Self {
            events,
            systems: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// The event manager this manager reports to.
    #[must_use]
    pub fn events(&self) -> &Rc<EventManager> {
        &self.events
    }

    /// Add `system`. It will be updated in each tick, after every system
    /// added before it.
    ///
    /// The system's [`init`](System::init) runs first; on success a
    /// [`SYSTEM_ADDED`] event is queued.
    ///
    /// # Errors
    ///
    /// - [`SystemError::DuplicateRegistration`] if a system of the same type
    ///   has already been added.
    /// - [`SystemError::Init`] if the system failed to initialise. It is not
    ///   added in that case.
    pub fn add_system<S: System>(&mut self, mut system: S) -> Result<(), SystemError> {
        let type_id = TypeId::of::<S>();
        if self.index.contains_key(&type_id) {
            return Err(SystemError::DuplicateRegistration {
                name: std::any::type_name::<S>(),
            });
        }

        system
            .init(&self.events)
            .map_err(|source| SystemError::Init {
                name: system.name().to_string(),
                source,
            })?;

        let name = system.name().to_string();
        self.index.insert(type_id, self.systems.len());
        self.systems.push(SystemEntry {
            type_id,
            system: Box::new(system),
        });

        info!(system = name, count = self.systems.len(), "system added");
        self.events
            .queue_event_with(SYSTEM_ADDED, SystemEventData { name });
        Ok(())
    }

    /// Remove the system of type `T` and hand it back. A [`SYSTEM_REMOVED`]
    /// event is queued.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::NotFound`] if no system of type `T` was added.
    pub fn remove_system<T: System>(&mut self) -> Result<Box<T>, SystemError> {
        let pos = self.position::<T>()?;
        let entry = self.systems.remove(pos);
        self.index.remove(&entry.type_id);
        for (i, later) in self.systems.iter().enumerate().skip(pos) {
            self.index.insert(later.type_id, i);
        }

        let name = entry.system.name().to_string();
        info!(system = name, count = self.systems.len(), "system removed");
        self.events
            .queue_event_with(SYSTEM_REMOVED, SystemEventData { name });

        let any: Box<dyn Any> = entry.system;
        any.downcast::<T>().map_err(|_| SystemError::NotFound {
            name: std::any::type_name::<T>(),
        })
    }

    /// Get the system of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::NotFound`] if no system of type `T` was added.
    pub fn get_system<T: System>(&self) -> Result<&T, SystemError> {
        let pos = self.position::<T>()?;
        self.systems[pos]
            .system
            .downcast_ref::<T>()
            .ok_or(SystemError::NotFound {
                name: std::any::type_name::<T>(),
            })
    }

    /// Get the system of type `T` mutably.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::NotFound`] if no system of type `T` was added.
    pub fn get_system_mut<T: System>(&mut self) -> Result<&mut T, SystemError> {
        let pos = self.position::<T>()?;
        self.systems[pos]
            .system
            .downcast_mut::<T>()
            .ok_or(SystemError::NotFound {
                name: std::any::type_name::<T>(),
            })
    }

    /// Returns `true` if a system of type `T` was added.
    #[must_use]
    pub fn contains<T: System>(&self) -> bool {
        self.index.contains_key(&TypeId::of::<T>())
    }

    /// Names of all systems, in update order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|entry| entry.system.name())
    }

    /// Number of systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if no system was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Tick every system once, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::Update`] for the first system that fails;
    /// systems after it are not updated this pass.
    pub fn update(&mut self, dt: f32) -> Result<(), SystemError> {
        for entry in &mut self.systems {
            trace!(system = entry.system.name(), dt, "updating system");
            entry
                .system
                .update_system(dt)
                .map_err(|source| SystemError::Update {
                    name: entry.system.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    fn position<T: System>(&self) -> Result<usize, SystemError> {
        self.index
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or(SystemError::NotFound {
                name: std::any::type_name::<T>(),
            })
    }
}

impl std::fmt::Debug for SystemManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemManager")
            .field("systems", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use engine_event::{Event, EventType};

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    #[derive(Debug)]
    struct Physics {
        log: Log,
        ticks: u32,
    }

    impl System for Physics {
        fn update_system(&mut self, dt: f32) -> anyhow::Result<()> {
            self.ticks += 1;
            self.log.borrow_mut().push(format!("physics {dt}"));
            Ok(())
        }

        fn name(&self) -> &str {
            "physics"
        }
    }

    #[derive(Debug)]
    struct Ai {
        log: Log,
    }

    impl System for Ai {
        fn update_system(&mut self, dt: f32) -> anyhow::Result<()> {
            self.log.borrow_mut().push(format!("ai {dt}"));
            Ok(())
        }

        fn name(&self) -> &str {
            "ai"
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl System for Broken {
        fn update_system(&mut self, _dt: f32) -> anyhow::Result<()> {
            anyhow::bail!("out of fuel")
        }
    }

    #[derive(Debug)]
    struct NeedsInit {
        ready: bool,
    }

    impl System for NeedsInit {
        fn update_system(&mut self, _dt: f32) -> anyhow::Result<()> {
            anyhow::ensure!(self.ready, "not initialised");
            Ok(())
        }

        fn init(&mut self, events: &Rc<EventManager>) -> anyhow::Result<()> {
            events.listen(EventType::from_name("test.ping"), |_| Ok(()))?;
            self.ready = true;
            Ok(())
        }
    }

    #[derive(Debug)]
    struct RefusesInit;

    impl System for RefusesInit {
        fn update_system(&mut self, _dt: f32) -> anyhow::Result<()> {
            Ok(())
        }

        fn init(&mut self, _events: &Rc<EventManager>) -> anyhow::Result<()> {
            anyhow::bail!("missing asset")
        }
    }

    fn manager() -> (SystemManager, Rc<EventManager>) {
        let events = Rc::new(EventManager::new());
        (SystemManager::new(Rc::clone(&events)), events)
    }

    fn added_names(events: &EventManager) -> Log {
        let seen = Log::default();
        let sink = Rc::clone(&seen);
        events
            .listen(SYSTEM_ADDED, move |e: &Event| {
                if let Some(data) = e.data::<SystemEventData>() {
                    sink.borrow_mut().push(data.name.clone());
                }
                Ok(())
            })
            .unwrap();
        seen
    }

    #[test]
    fn test_update_runs_in_registration_order() {
        let (mut systems, _events) = manager();
        let log = Log::default();
        systems
            .add_system(Ai {
                log: Rc::clone(&log),
            })
            .unwrap();
        systems
            .add_system(Physics {
                log: Rc::clone(&log),
                ticks: 0,
            })
            .unwrap();

        systems.update(0.5).unwrap();
        systems.update(0.25).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["ai 0.5", "physics 0.5", "ai 0.25", "physics 0.25"]
        );
        assert_eq!(systems.names().collect::<Vec<_>>(), vec!["ai", "physics"]);
    }

    #[test]
    fn test_duplicate_system_rejected() {
        let (mut systems, events) = manager();
        let log = Log::default();
        systems
            .add_system(Ai {
                log: Rc::clone(&log),
            })
            .unwrap();
        let err = systems.add_system(Ai { log }).unwrap_err();
        assert!(matches!(err, SystemError::DuplicateRegistration { .. }));
        assert_eq!(systems.len(), 1);
        // Only the successful registration was announced.
        assert_eq!(events.event_count(), 1);
    }

    #[test]
    fn test_add_queues_system_added_event() {
        let (mut systems, events) = manager();
        let seen = added_names(&events);
        systems.add_system(Ai { log: Log::default() }).unwrap();

        // Announced through the queue, not delivered synchronously.
        assert!(seen.borrow().is_empty());
        events.process_events(0.0).unwrap();
        assert_eq!(*seen.borrow(), vec!["ai"]);
    }

    #[test]
    fn test_get_system() {
        let (mut systems, _events) = manager();
        systems
            .add_system(Physics {
                log: Log::default(),
                ticks: 0,
            })
            .unwrap();
        systems.update(1.0).unwrap();

        assert_eq!(systems.get_system::<Physics>().unwrap().ticks, 1);
        systems.get_system_mut::<Physics>().unwrap().ticks = 10;
        assert_eq!(systems.get_system::<Physics>().unwrap().ticks, 10);
        assert!(systems.contains::<Physics>());
    }

    #[test]
    fn test_get_missing_system_is_not_found() {
        let (systems, _events) = manager();
        let err = systems.get_system::<Physics>().unwrap_err();
        match err {
            SystemError::NotFound { name } => assert!(name.ends_with("Physics")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_remove_system() {
        let (mut systems, events) = manager();
        let log = Log::default();
        systems
            .add_system(Ai {
                log: Rc::clone(&log),
            })
            .unwrap();
        systems
            .add_system(Physics {
                log: Rc::clone(&log),
                ticks: 3,
            })
            .unwrap();
        events.flush().unwrap();

        let removed = systems.remove_system::<Ai>().unwrap();
        assert_eq!(removed.name(), "ai");
        assert!(!systems.contains::<Ai>());
        assert_eq!(systems.get_system::<Physics>().unwrap().ticks, 3);
        assert_eq!(events.event_count(), 1);

        assert!(matches!(
            systems.remove_system::<Ai>(),
            Err(SystemError::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_failure_stops_pass() {
        let (mut systems, _events) = manager();
        let log = Log::default();
        systems.add_system(Broken).unwrap();
        systems.add_system(Ai { log: Rc::clone(&log) }).unwrap();

        let err = systems.update(1.0).unwrap_err();
        assert!(matches!(err, SystemError::Update { .. }));
        assert!(err.to_string().contains("out of fuel"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_init_runs_before_registration() {
        let (mut systems, events) = manager();
        systems.add_system(NeedsInit { ready: false }).unwrap();
        assert_eq!(events.listener_count(EventType::from_name("test.ping")), 1);
        systems.update(1.0).unwrap();
    }

    #[test]
    fn test_failed_init_rejects_system() {
        let (mut systems, events) = manager();
        let err = systems.add_system(RefusesInit).unwrap_err();
        assert!(matches!(err, SystemError::Init { .. }));
        assert!(systems.is_empty());
        assert_eq!(events.event_count(), 0);
    }
}
