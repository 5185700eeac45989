//! # Scoped store binding for one key.
//!
//! [`KeyBinding`] is the consumer-side attach/detach wrapper around one store
//! key: ensure + subscribe on attach, mirror + redraw on every write,
//! unsubscribe on drop.
//!
//! ## Rules
//! - Attach ensures the entry (defaults are first-write-wins) and registers
//!   exactly one listener.
//! - The redraw callback runs after the mirror is updated, synchronously
//!   inside the writing `set` call.
//! - Dropping the binding unsubscribes on every exit path; a leaked listener
//!   requires leaking the binding itself.
//! - Liveness: the listener upgrades a weak reference before touching the
//!   mirror, so a write racing a detach cannot act on a dead binding.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::StoreError;
use crate::store::{ListenerId, Store};

/// Consumer-local mirror of the bound key's value.
struct BindingShared<T> {
    latest: RwLock<T>,
}

/// RAII subscription of one consumer to one store key.
///
/// Mirrors the key's value into consumer-local state and invokes a redraw
/// callback on every write, the way a reactive component re-renders. The
/// subscription lives exactly as long as the binding.
///
/// ## Example
/// ```
/// use statevisor::{KeyBinding, Store};
///
/// let store: Store<u64> = Store::new();
/// let binding = KeyBinding::attach(&store, "count", 5, |v| {
///     println!("re-render with {v}");
/// })?;
///
/// assert_eq!(binding.latest(), 5);
/// binding.set(6)?;
/// assert_eq!(binding.latest(), 6);
///
/// drop(binding); // unsubscribes
/// assert_eq!(store.listener_count("count"), 0);
/// # Ok::<(), statevisor::StoreError>(())
/// ```
pub struct KeyBinding<T> {
    store: Store<T>,
    key: String,
    id: ListenerId,
    shared: Arc<BindingShared<T>>,
}

impl<T: Clone + Send + Sync + 'static> KeyBinding<T> {
    /// Attaches to `key`: ensures the entry, seeds the mirror, subscribes.
    ///
    /// The mirror starts from the entry's current value, which is the supplied
    /// `default` only if no earlier `ensure` or `set` touched the key.
    ///
    /// # Errors
    /// Surfaces [`StoreError`] from the underlying subscribe/read. The entry
    /// is ensured first and entries are never removed, so in practice attach
    /// cannot fail; the `Result` keeps the store's fail-fast surface visible.
    pub fn attach(
        store: &Store<T>,
        key: &str,
        default: T,
        redraw: impl Fn(&T) + Send + Sync + 'static,
    ) -> Result<Self, StoreError> {
        store.ensure(key, default);
        let current = store.get(key)?;

        let shared = Arc::new(BindingShared {
            latest: RwLock::new(current),
        });
        let weak = Arc::downgrade(&shared);
        let id = store.subscribe(key, move |value: &T| {
            let Some(shared) = weak.upgrade() else { return };
            *shared
                .latest
                .write()
                .unwrap_or_else(PoisonError::into_inner) = value.clone();
            redraw(value);
        })?;

        Ok(Self {
            store: store.clone(),
            key: key.to_string(),
            id,
            shared,
        })
    }

    /// Returns the mirrored value: the last observed write, or the entry
    /// value seen at attach time.
    #[must_use]
    pub fn latest(&self) -> T {
        self.shared
            .latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Write-through setter.
    ///
    /// Writes to the store, so every consumer of the key re-renders, not just
    /// this one. The own mirror is updated by the fan-out before this returns.
    pub fn set(&self, value: T) -> Result<(), StoreError> {
        self.store.set(&self.key, value)
    }

    /// Returns the bound key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the listener handle, mainly for diagnostics.
    pub fn listener_id(&self) -> &ListenerId {
        &self.id
    }
}

impl<T> Drop for KeyBinding<T> {
    fn drop(&mut self) {
        // Stale ids are a tolerated no-op, so teardown races are harmless.
        self.store.unsubscribe(&self.key, &self.id);
    }
}
