//! # Change-driven watcher for controller snapshots.
//!
//! Adapts a controller's watch channel to a plain callback: one spawned loop
//! per consumer, invoked with the current snapshot at attach time and with
//! every fresh snapshot after, until the controller goes away.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::tasks::TaskSnapshot;

/// Spawns a loop invoking `on_change` with the current snapshot, then on
/// every change.
///
/// The callback receives the freshest value at wake time; intermediate
/// snapshots may be skipped under load (watch semantics). The loop ends when
/// the last controller handle is dropped; abort the returned [`JoinHandle`]
/// to detach earlier.
///
/// ## Example
/// ```no_run
/// use statevisor::{OperationFn, OperationRef, TaskController, TaskError, TaskSpec};
/// use statevisor::spawn_snapshot_watcher;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let op: OperationRef<u64> = OperationFn::arc("fetch", |_ctx| async { Ok::<_, TaskError>(42) });
/// let controller = TaskController::start(TaskSpec::new(op));
///
/// let watcher = spawn_snapshot_watcher(controller.watch(), |snap| {
///     println!("loading={} data={:?}", snap.is_loading, snap.data);
/// });
/// # watcher.abort();
/// # }
/// ```
pub fn spawn_snapshot_watcher<T, F>(
    mut rx: watch::Receiver<TaskSnapshot<T>>,
    on_change: F,
) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&TaskSnapshot<T>) + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let snap = rx.borrow_and_update().clone();
            on_change(&snap);
            if rx.changed().await.is_err() {
                return;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::tasks::{OperationFn, OperationRef, TaskController, TaskSpec};
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    #[tokio::test]
    async fn test_watcher_observes_settlement() {
        let op: OperationRef<String> = OperationFn::arc("ok", |_ctx| async {
            sleep(Duration::from_millis(5)).await;
            Ok::<_, TaskError>("done".to_string())
        });
        let controller = TaskController::start(TaskSpec::new(op));

        let (tx, mut snaps) = tokio::sync::mpsc::unbounded_channel();
        let watcher = spawn_snapshot_watcher(controller.watch(), move |snap| {
            let _ = tx.send(snap.clone());
        });

        loop {
            let snap = timeout(Duration::from_secs(5), snaps.recv())
                .await
                .expect("watcher went silent")
                .expect("watcher channel closed");
            if !snap.is_loading {
                assert_eq!(snap.data.as_deref(), Some("done"));
                break;
            }
        }
        watcher.abort();
    }

    #[tokio::test]
    async fn test_watcher_ends_when_controller_is_dropped() {
        let op: OperationRef<u64> = OperationFn::arc("quick", |_ctx| async { Ok(1) });
        let controller = TaskController::start(TaskSpec::new(op));

        let watcher = spawn_snapshot_watcher(controller.watch(), |_| {});
        drop(controller);

        timeout(Duration::from_secs(5), watcher)
            .await
            .expect("watcher must end once the controller is gone")
            .expect("watcher loop panicked");
    }
}
