//! # Simple logging taps for debugging and demos.
//!
//! Ready-made observers that print store writes and task transitions to
//! stdout in a human-readable format. Enabled via the `logging` feature;
//! primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [store] key=count value=6
//! [task] name=fetch loading=true data=None error=None
//! [task] name=fetch loading=false data=Some("payload") error=None
//! ```
//!
//! Not intended for production use - register your own listener or watcher
//! for structured logging or metrics collection.

use std::fmt::Debug;

use tokio::task::JoinHandle;

use crate::binding::spawn_snapshot_watcher;
use crate::error::StoreError;
use crate::store::{ListenerId, Store};
use crate::tasks::{TaskController, TaskSnapshot};

/// Subscribes a stdout listener to `key`.
///
/// Prints one line per write. The listener stays registered until removed
/// with the returned id; fails with [`StoreError::UnknownKey`] if the entry
/// does not exist.
pub fn log_store_updates<T: Debug + 'static>(
    store: &Store<T>,
    key: &str,
) -> Result<ListenerId, StoreError> {
    let key_owned = key.to_string();
    store.subscribe(key, move |value: &T| {
        println!("[store] key={key_owned} value={value:?}");
    })
}

/// Spawns a stdout watcher over the controller's snapshots.
///
/// Prints the current state immediately and one line per transition. Abort
/// the returned handle to stop logging; the loop also ends when the last
/// controller handle is dropped.
pub fn log_task_transitions<T>(controller: &TaskController<T>) -> JoinHandle<()>
where
    T: Debug + Clone + Send + Sync + 'static,
{
    let name = controller.name().to_string();
    spawn_snapshot_watcher(controller.watch(), move |snap: &TaskSnapshot<T>| {
        println!(
            "[task] name={name} loading={} data={:?} error={:?}",
            snap.is_loading, snap.data, snap.error
        );
    })
}
