//! # Per-key entry: current value plus ordered listeners.
//!
//! Crate-private. Entries are created lazily by `ensure` and live for the
//! store's lifetime; only the listener list changes as consumers attach and
//! detach.

use crate::store::listener::{Listener, ListenerId};

/// State held for one key.
///
/// Listener order is registration order; fan-out walks the list front to back.
pub(crate) struct Entry<T> {
    pub(crate) value: T,
    listeners: Vec<(ListenerId, Listener<T>)>,
}

impl<T> Entry<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            value,
            listeners: Vec::new(),
        }
    }

    /// Registers a listener and mints an id unused within this entry.
    pub(crate) fn subscribe(&mut self, listener: Listener<T>) -> ListenerId {
        let id = loop {
            let candidate = ListenerId::generate();
            if !self.listeners.iter().any(|(id, _)| *id == candidate) {
                break candidate;
            }
        };
        self.listeners.push((id.clone(), listener));
        id
    }

    /// Removes the listener; `false` if the id is unknown or already removed.
    pub(crate) fn remove(&mut self, id: &ListenerId) -> bool {
        match self.listeners.iter().position(|(lid, _)| lid == id) {
            Some(idx) => {
                self.listeners.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Clones the listener handles in registration order.
    ///
    /// Fan-out runs over this snapshot outside the store lock: listeners added
    /// during a write miss it, listeners removed during one may still run once.
    pub(crate) fn listeners_snapshot(&self) -> Vec<Listener<T>> {
        self.listeners.iter().map(|(_, l)| l.clone()).collect()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
