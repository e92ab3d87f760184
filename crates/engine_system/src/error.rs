//! System manager error types.

use engine_event::EventError;

/// Errors raised by the [`SystemManager`](crate::SystemManager).
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// A system of the same type has already been added.
    #[error("a system of type {name} has already been added")]
    DuplicateRegistration {
        /// Type name of the system.
        name: &'static str,
    },

    /// No system of the requested type has been added.
    #[error("a system of type {name} has never been added")]
    NotFound {
        /// Type name that was looked up.
        name: &'static str,
    },

    /// A system failed to initialise when it was added.
    #[error("system {name} failed to initialise: {source}")]
    Init {
        /// Name of the failing system.
        name: String,
        /// The underlying failure.
        source: anyhow::Error,
    },

    /// A system failed during its per-tick update.
    #[error("system {name} failed to update: {source}")]
    Update {
        /// Name of the failing system.
        name: String,
        /// The underlying failure.
        source: anyhow::Error,
    },

    /// The event manager reported an error.
    #[error(transparent)]
    Event(#[from] EventError),
}
