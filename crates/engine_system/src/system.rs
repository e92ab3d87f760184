//! The [`System`] trait implemented by every game system.

use std::any::Any;
use std::rc::Rc;

use engine_event::EventManager;

/// A game system, updated once per tick by the
/// [`SystemManager`](crate::SystemManager).
///
/// Systems are identified by their concrete type: a manager holds at most one
/// system of each type.
///
/// # Examples
///
/// ```rust
/// use engine_system::System;
///
/// #[derive(Default)]
/// struct Clock {
///     elapsed: f32,
/// }
///
/// impl System for Clock {
///     fn update_system(&mut self, dt: f32) -> anyhow::Result<()> {
///         self.elapsed += dt;
///         Ok(())
///     }
/// }
/// ```
pub trait System: Any {
    /// Advance the system by `dt` seconds.
    ///
    /// # Errors
    ///
    /// Any error aborts the current update pass.
    fn update_system(&mut self, dt: f32) -> anyhow::Result<()>;

    /// Called once when the system is added, before the `SYSTEM_ADDED` event
    /// is queued. The usual place to register listeners.
    ///
    /// # Errors
    ///
    /// An error rejects the system.
    fn init(&mut self, events: &Rc<EventManager>) -> anyhow::Result<()> {
        let _ = events;
        Ok(())
    }

    /// Human-readable name, used in logs and lifecycle events.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl dyn System {
    /// [`TypeId`](std::any::TypeId) of the concrete system type.
    #[must_use]
    pub fn system_type_id(&self) -> std::any::TypeId {
        (self as &dyn Any).type_id()
    }

    /// Returns `true` if the boxed system is a `T`.
    #[must_use]
    pub fn is<T: System>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    /// Downcast to the concrete system type.
    #[must_use]
    pub fn downcast_ref<T: System>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }

    /// Mutably downcast to the concrete system type.
    #[must_use]
    pub fn downcast_mut<T: System>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut::<T>()
    }
}
