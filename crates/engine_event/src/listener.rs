//! Listener handles and the per-channel listener registry.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::event::{Event, EventType};

/// Signature of a listener callback.
pub type ListenerFn = dyn Fn(&Event) -> anyhow::Result<()>;

/// A cloneable handle to a listener callback.
///
/// Two handles are equal when they point at the same callback allocation,
/// so a clone of a handle can be used to remove it again later. Wrapping the
/// same closure twice with [`Listener::new`] yields two *different*
/// listeners.
#[derive(Clone)]
pub struct Listener(Rc<ListenerFn>);

impl Listener {
    /// Wrap a callback in a new listener handle.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Event) -> anyhow::Result<()> + 'static,
    {
        Self(Rc::new(callback))
    }

    /// Invoke the callback.
    ///
    /// # Errors
    ///
    /// Returns whatever the callback returns.
    pub fn call(&self, event: &Event) -> anyhow::Result<()> {
        (self.0)(event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// Key of a listener chain.
///
/// The wildcard chain has its own variant so it can never alias a real
/// [`EventType`], whatever value that type hashes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Channel {
    Type(EventType),
    All,
}

/// Ordered listener chains keyed by channel.
#[derive(Debug, Default)]
pub(crate) struct ListenerRegistry {
    chains: HashMap<Channel, Vec<Listener>>,
    /// Total successful registrations, never decremented.
    registered: usize,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append `listener` to the chain for `channel`. Duplicates are kept.
    pub(crate) fn register(&mut self, channel: Channel, listener: Listener) {
        self.chains.entry(channel).or_default().push(listener);
        self.registered += 1;
    }

    /// Remove the first entry equal to `listener`. Returns `true` if one was
    /// removed.
    pub(crate) fn remove(&mut self, channel: Channel, listener: &Listener) -> bool {
        let Some(chain) = self.chains.get_mut(&channel) else {
            return false;
        };
        let Some(pos) = chain.iter().position(|l| l == listener) else {
            return false;
        };
        chain.remove(pos);
        if chain.is_empty() {
            self.chains.remove(&channel);
        }
        true
    }

    /// Snapshot the listeners an event of `event_type` is delivered to:
    /// the type chain, then the wildcard chain, each in registration order.
    pub(crate) fn recipients(&self, event_type: EventType) -> Vec<Listener> {
        let specific = self.chains.get(&Channel::Type(event_type));
        let all = self.chains.get(&Channel::All);
        specific
            .into_iter()
            .chain(all)
            .flat_map(|chain| chain.iter().cloned())
            .collect()
    }

    pub(crate) fn chain_len(&self, channel: Channel) -> usize {
        self.chains.get(&channel).map_or(0, Vec::len)
    }

    pub(crate) fn registered(&self) -> usize {
        self.registered
    }
}
