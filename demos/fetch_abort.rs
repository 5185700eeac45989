//! # Example: fetch_abort
//!
//! A delayed fetch raced against a user abort, the way a UI cancels an
//! in-flight request when the user clicks away.
//!
//! Demonstrates how to:
//! - Define the operation with [`OperationFn`] (fresh future per run).
//! - Attach success/error callbacks via [`TaskSpec::builder`].
//! - Observe `{data, is_loading, error}` with [`spawn_snapshot_watcher`].
//! - Abort the in-flight run, then run again.
//!
//! ## Flow
//! ```text
//! TaskController::start(spec)
//!     ├─► initial run: loading=true
//!     ├─► abort() ──► settles silently: loading=false, no data, no error
//!     ├─► run()   ──► second execution, allowed to finish
//!     └─► success ──► data=["apples", "pears"], on_success, loading=false
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example fetch_abort
//! ```

use std::time::Duration;

use statevisor::{
    OperationFn, OperationRef, TaskController, TaskError, TaskSpec, spawn_snapshot_watcher,
};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. A slow fetch; checks its token at the only await point
    let fetch: OperationRef<Vec<String>> =
        OperationFn::arc("products", |ctx: CancellationToken| async move {
            println!("[products] fetch started");
            tokio::select! {
                _ = ctx.cancelled() => {
                    println!("[products] fetch observed abort");
                    Err(TaskError::Aborted)
                }
                _ = tokio::time::sleep(Duration::from_millis(800)) => {
                    Ok(vec!["apples".to_string(), "pears".to_string()])
                }
            }
        });

    // 2. Spec with callbacks; creation triggers the initial run
    let spec = TaskSpec::builder(fetch)
        .on_success(|items: &Vec<String>| println!("[products] success: {items:?}"))
        .on_error(|err| println!("[products] error: {err}"))
        .build();
    let controller = TaskController::start(spec);

    // 3. Watch the snapshot like a component re-rendering
    let watcher = spawn_snapshot_watcher(controller.watch(), |snap| {
        println!(
            "[render] loading={} data={:?} error={:?}",
            snap.is_loading, snap.data, snap.error
        );
    });

    // 4. Abort before the fetch can settle
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("--- abort ---");
    controller.abort();

    // 5. Run again; this one is allowed to finish
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("--- run again ---");
    controller.run();

    // 6. Wait for the settlement, then stop watching
    let mut rx = controller.watch();
    loop {
        let snap = rx.borrow_and_update().clone();
        if !snap.is_loading && snap.data.is_some() {
            break;
        }
        rx.changed().await?;
    }
    watcher.abort();
    Ok(())
}
