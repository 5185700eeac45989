//! # Example: logging_taps
//!
//! The built-in stdout taps observing both primitives at once.
//!
//! Demonstrates how to:
//! - Tap a store key with [`log_store_updates`].
//! - Tap a controller's transitions with [`log_task_transitions`].
//!
//! ## Flow
//! ```text
//! store.set(n)           ──► [store] key=count value=n
//! controller transitions ──► [task] name=ping loading=... data=... error=...
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example logging_taps --features logging
//! ```

use std::time::Duration;

use statevisor::{
    OperationFn, OperationRef, Store, TaskController, TaskError, TaskSpec, log_store_updates,
    log_task_transitions,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Tap a store key
    let store: Store<u64> = Store::new();
    store.ensure("count", 0);
    let tap = log_store_updates(&store, "count")?;
    for n in 1..=3 {
        store.set("count", n)?;
    }
    store.unsubscribe("count", &tap);

    // 2. Tap a controller
    let op: OperationRef<&'static str> = OperationFn::arc("ping", |_ctx| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<_, TaskError>("pong")
    });
    let controller = TaskController::start(TaskSpec::new(op));
    let watcher = log_task_transitions(&controller);

    let mut rx = controller.watch();
    loop {
        let snap = rx.borrow_and_update().clone();
        if !snap.is_loading {
            break;
        }
        rx.changed().await?;
    }

    // Give the tap a beat to print the settled line before exiting
    tokio::time::sleep(Duration::from_millis(50)).await;
    watcher.abort();
    Ok(())
}
