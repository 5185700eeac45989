//! # Binding layer: store and controllers adapted to a re-render cycle.
//!
//! Consumers of the core are reactive components: they subscribe on attach,
//! re-render on every notification, and unsubscribe on detach. This module
//! provides both halves of that contract:
//!
//! - [`KeyBinding`] scopes a store subscription to a value's lifetime (RAII),
//!   mirroring the key into consumer-local state.
//! - [`spawn_snapshot_watcher`] turns a controller's watch channel into a
//!   per-consumer callback loop.

mod key;
mod watcher;

pub use key::KeyBinding;
pub use watcher::spawn_snapshot_watcher;
