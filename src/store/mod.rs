//! # Observable store: keyed values with synchronous listener fan-out.
//!
//! The store is the process-wide side of the crate: one [`Store`] per value
//! type, constructed by the application and handed (by clone) to every
//! consumer. Consumers read and write by key; every write is fanned out to
//! the key's listeners before the call returns.
//!
//! See [`Store`] for the contract and [`KeyBinding`](crate::KeyBinding)
//! for the scoped consumer-side wrapper.

mod entry;
mod listener;
mod store;

pub use listener::{Listener, ListenerId};
pub use store::Store;
