//! # Observable key-value store with synchronous fan-out.
//!
//! [`Store`] maps string keys to entries of `(current value, listeners)`.
//! Every write notifies the key's listeners immediately, in registration
//! order, before the write call returns.
//!
//! ## Architecture
//! ```text
//! set(key, v) ──► write lock ──► entry.value = v
//!                     │
//!                     │  clone listener list (registration order)
//!                     ▼
//!                 unlock ──► cb1(&v) ──► cb2(&v) ──► ... ──► cbN(&v)
//!                              (callbacks run outside the lock)
//! ```
//!
//! ## Rules
//! - Entries are created lazily by [`Store::ensure`] and never destroyed.
//! - The first `ensure` for a key wins; later defaults are silently ignored.
//! - `get`/`set`/`subscribe` on a key without an entry fail with
//!   [`StoreError::UnknownKey`]; `unsubscribe` tolerates unknown keys/ids.
//! - Fan-out is synchronous and reentrant-safe: callbacks run outside the
//!   lock, so a listener may call any store method. Listeners added during a
//!   fan-out do not see the in-progress write; listeners removed during one
//!   may still be invoked for it.
//! - A panicking listener is caught and reported; later listeners still run.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StoreError;
use crate::store::entry::Entry;
use crate::store::listener::ListenerId;

/// Shared observable map from key to `(value, listeners)`.
///
/// ### Responsibilities
/// - Holds the authoritative value per key (last write wins).
/// - Fans each write out to the key's listeners, synchronously, in
///   registration order.
/// - Tracks listener registration/removal by [`ListenerId`].
///
/// ### Sharing
/// `Store` is a cheap handle: `clone()` returns a second handle to the same
/// entries. The intended shape is one store per value type, constructed by the
/// application and passed to every consumer (there is no global instance).
/// Any holder of a handle can read or write any key; the store has no access
/// control.
///
/// ## Example
/// ```
/// use statevisor::Store;
///
/// let store: Store<u64> = Store::new();
/// store.ensure("count", 5);
/// assert_eq!(store.get("count")?, 5);
///
/// let id = store.subscribe("count", |v| println!("count is now {v}"))?;
/// store.set("count", 6)?;
/// assert_eq!(store.get("count")?, 6);
///
/// assert!(store.unsubscribe("count", &id));
/// # Ok::<(), statevisor::StoreError>(())
/// ```
pub struct Store<T> {
    entries: Arc<RwLock<HashMap<Arc<str>, Entry<T>>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Store<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    // Callbacks never run under the lock, so a poisoned guard only means some
    // writer panicked between acquire and release; the map itself is still
    // consistent and the store keeps working.
    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<Arc<str>, Entry<T>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<Arc<str>, Entry<T>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates the entry for `key` with `default` if absent.
    ///
    /// No-op when the entry already exists: the first supplied default wins
    /// and later calls with a different default are silently ignored. Callers
    /// that need the current value should follow up with [`Store::get`].
    pub fn ensure(&self, key: &str, default: T) {
        let mut entries = self.write_entries();
        if !entries.contains_key(key) {
            entries.insert(Arc::from(key), Entry::new(default));
        }
    }

    /// Registers a listener for `key`; returns its removal handle.
    ///
    /// The listener runs synchronously on every subsequent [`Store::set`] for
    /// this key, after listeners registered before it. Fails with
    /// [`StoreError::UnknownKey`] if the entry does not exist.
    pub fn subscribe(
        &self,
        key: &str,
        callback: impl Fn(&T) + Send + Sync + 'static,
    ) -> Result<ListenerId, StoreError> {
        let mut entries = self.write_entries();
        let entry = entries.get_mut(key).ok_or_else(|| StoreError::UnknownKey {
            key: key.to_string(),
        })?;
        Ok(entry.subscribe(Arc::new(callback)))
    }

    /// Removes a listener; returns whether anything was removed.
    ///
    /// Unknown keys and stale ids return `false` rather than failing, so
    /// teardown paths may unsubscribe unconditionally (double cleanup is a
    /// no-op).
    pub fn unsubscribe(&self, key: &str, id: &ListenerId) -> bool {
        let mut entries = self.write_entries();
        entries.get_mut(key).map(|e| e.remove(id)).unwrap_or(false)
    }

    /// Returns true if an entry exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.read_entries().contains_key(key)
    }

    /// Returns the sorted list of known keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let entries = self.read_entries();
        let mut keys: Vec<String> = entries.keys().map(|k| k.to_string()).collect();
        keys.sort_unstable();
        keys
    }

    /// Number of listeners currently registered for `key` (0 if unknown).
    #[must_use]
    pub fn listener_count(&self, key: &str) -> usize {
        self.read_entries()
            .get(key)
            .map(Entry::listener_count)
            .unwrap_or(0)
    }
}

impl<T: Clone> Store<T> {
    /// Returns the current value for `key`.
    ///
    /// Fails with [`StoreError::UnknownKey`] if no entry was ever ensured.
    /// Callers that cannot tolerate the error should colocate a
    /// [`Store::ensure`] with the read, as the binding layer does.
    pub fn get(&self, key: &str) -> Result<T, StoreError> {
        self.read_entries()
            .get(key)
            .map(|e| e.value.clone())
            .ok_or_else(|| StoreError::UnknownKey {
                key: key.to_string(),
            })
    }

    /// Overwrites the value for `key` and notifies its listeners.
    ///
    /// Notification is synchronous: every listener registered at the moment of
    /// the write runs before `set` returns, in registration order, with a
    /// reference to the new value. The listener list is snapshotted under the
    /// lock and invoked outside it, so callbacks may freely call back into the
    /// store. A panicking listener is reported to stderr and does not stop the
    /// fan-out.
    ///
    /// Fails with [`StoreError::UnknownKey`] if no entry exists; a write never
    /// creates an entry.
    pub fn set(&self, key: &str, value: T) -> Result<(), StoreError> {
        let snapshot = {
            let mut entries = self.write_entries();
            let entry = entries.get_mut(key).ok_or_else(|| StoreError::UnknownKey {
                key: key.to_string(),
            })?;
            entry.value = value.clone();
            entry.listeners_snapshot()
        };

        for listener in snapshot {
            if let Err(panic_err) = catch_unwind(AssertUnwindSafe(|| listener(&value))) {
                eprintln!("[statevisor] listener on key '{key}' panicked: {panic_err:?}");
            }
        }
        Ok(())
    }
}
