//! # Task controller: cancellable execution with observable state.
//!
//! [`TaskController`] owns one conceptual in-flight execution at a time and
//! exposes its lifecycle as a [`TaskSnapshot`] on a watch channel.
//!
//! ## Architecture
//! ```text
//! run() ──► gate open? ──► generation += 1, install fresh token
//!   │                            │
//!   │ (closed: complete no-op)   ▼
//!   │                  spawn operation task (child token)
//!   ▼                            │
//! snapshot:                      ▼
//!   loading=true     ┌──────────────────────────────────┐
//!   error=None       │ drive: select! {                 │
//!                    │   token cancelled → Aborted      │
//!                    │   operation joined → Ok / Err    │
//!                    │ }                                │
//!                    └────────────────┬─────────────────┘
//!                                     ▼
//!                      settle (current generation only)
//!                       ├─ success → data, on_success, loading=false
//!                       ├─ failure → error, on_error,  loading=false
//!                       └─ abort   → loading=false
//! ```
//!
//! ## Rules
//! - `run()` with a closed gate changes nothing: no state, no spawn.
//! - Overlapping `run()` calls are legal. Every accepted call bumps the
//!   generation; the newest generation owns the snapshot and settlements from
//!   older ones are dropped.
//! - A settlement callback may re-invoke `run()`. The loading flag then
//!   belongs to the new generation and stays up until that run settles.
//! - `abort()` cancels only the live token, i.e. the most recent accepted run.
//! - An abort settles silently: loading ends, `data` and `error` untouched.
//! - An operation that never checks its token is not stopped by `abort()`; it
//!   keeps running to completion and merely stops being observed.
//! - Dropping the last controller handle cancels the live token.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::snapshot::TaskSnapshot;
use crate::tasks::spec::TaskSpec;

/// Live execution bookkeeping.
struct RunSlot {
    /// Bumped once per accepted `run()`; settlements carrying an older value are stale.
    generation: u64,
    /// Abort handle of the in-flight execution, `None` once it settles or aborts.
    token: Option<CancellationToken>,
}

struct ControllerInner<T> {
    spec: TaskSpec<T>,
    state: watch::Sender<TaskSnapshot<T>>,
    slot: Mutex<RunSlot>,
}

/// Cancellable executor for one operation, with observable state.
///
/// ### Responsibilities
/// - Runs the spec's operation on demand ([`run`](TaskController::run)) and
///   once automatically at creation, honoring the gate.
/// - Races every execution against an abort token; publishes exactly one
///   settlement per owned execution.
/// - Exposes state as [`TaskSnapshot`] via [`snapshot`](TaskController::snapshot)
///   (pull) and [`watch`](TaskController::watch) (change-driven).
///
/// ### Sharing
/// `TaskController` is a cheap handle: `clone()` observes and drives the same
/// execution state. When the last handle is dropped the live token is
/// cancelled, so a cooperative in-flight operation stops instead of running
/// unobservable forever.
///
/// ## Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use statevisor::{OperationFn, OperationRef, TaskController, TaskError, TaskSpec};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let op: OperationRef<String> = OperationFn::arc("greet", |_ctx: CancellationToken| async {
///         Ok::<_, TaskError>("hello".to_string())
///     });
///
///     // Creation triggers one execution automatically.
///     let controller = TaskController::start(TaskSpec::new(op));
///
///     let mut rx = controller.watch();
///     loop {
///         let snap = rx.borrow_and_update().clone();
///         if !snap.is_loading {
///             assert_eq!(snap.data.as_deref(), Some("hello"));
///             break;
///         }
///         rx.changed().await.unwrap();
///     }
/// }
/// ```
pub struct TaskController<T> {
    inner: Arc<ControllerInner<T>>,
}

impl<T> Clone for TaskController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> TaskController<T> {
    /// Creates the controller and triggers the initial execution.
    ///
    /// The gate applies to the initial execution like to any other: a closed
    /// gate leaves the controller idle. Must be called within a Tokio runtime.
    #[must_use]
    pub fn start(spec: TaskSpec<T>) -> Self {
        let (state, _) = watch::channel(TaskSnapshot::default());
        let controller = Self {
            inner: Arc::new(ControllerInner {
                spec,
                state,
                slot: Mutex::new(RunSlot {
                    generation: 0,
                    token: None,
                }),
            }),
        };
        controller.run();
        controller
    }

    /// Convenience: returns the operation name.
    pub fn name(&self) -> &str {
        self.inner.spec.name()
    }

    /// Returns the current state as an owned snapshot.
    #[must_use]
    pub fn snapshot(&self) -> TaskSnapshot<T> {
        self.inner.state.borrow().clone()
    }

    /// Returns a receiver notified on every snapshot change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<TaskSnapshot<T>> {
        self.inner.state.subscribe()
    }

    /// Starts a new execution, unless the gate is closed.
    ///
    /// On an accepted call: the generation is bumped, a fresh abort token is
    /// installed, `is_loading` flips to true and `error` is cleared, and the
    /// operation is spawned with a child of the token. The call itself returns
    /// immediately; settlement arrives through the snapshot.
    ///
    /// Must be called within a Tokio runtime.
    pub fn run(&self) {
        if !self.inner.spec.should_execute() {
            return;
        }

        let token = CancellationToken::new();
        let generation = {
            // The start writes share the bump's critical section, so they
            // cannot land after a newer run already settled.
            let mut slot = self.inner.lock_slot();
            slot.generation += 1;
            slot.token = Some(token.clone());
            self.inner.state.send_modify(|s| {
                s.is_loading = true;
                s.error = None;
            });
            slot.generation
        };

        let operation = Arc::clone(self.inner.spec.operation());
        let op_token = token.child_token();
        let handle = tokio::spawn(async move { operation.run(op_token).await });

        tokio::spawn(drive(
            Arc::downgrade(&self.inner),
            generation,
            token,
            handle,
        ));
    }

    /// Aborts the in-flight execution, if any.
    ///
    /// Cancels and clears the live token; with overlapping runs only the most
    /// recent one is affected. A no-op when nothing is in flight. The aborted
    /// execution settles silently: `is_loading` ends, `data`/`error` stay.
    pub fn abort(&self) {
        let token = self.inner.lock_slot().token.take();
        if let Some(token) = token {
            token.cancel();
        }
    }
}

impl<T> ControllerInner<T> {
    // User callbacks never run under this lock. Snapshot writes may: the
    // watch sender only wakes receivers, it runs no user code. A poisoned
    // guard means a panicking holder elsewhere; the slot data itself stays
    // consistent.
    fn lock_slot(&self) -> MutexGuard<'_, RunSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send + Sync + 'static> ControllerInner<T> {
    /// Applies one settlement if its generation still owns the snapshot.
    ///
    /// The outcome write shares the staleness check's critical section, and
    /// the closing `is_loading` write re-checks ownership: a run started
    /// inside a callback (or concurrently) keeps its own loading state.
    fn settle(&self, generation: u64, outcome: Result<T, TaskError>) {
        {
            let mut slot = self.lock_slot();
            if slot.generation != generation {
                return; // a newer run owns the snapshot
            }
            slot.token = None;
            match &outcome {
                Ok(value) => {
                    let value = value.clone();
                    self.state.send_modify(|s| s.data = Some(value));
                }
                Err(error) if error.is_abort() => {}
                Err(error) => {
                    let error = error.clone();
                    self.state.send_modify(|s| s.error = Some(error));
                }
            }
        }

        // Callbacks may re-enter `run()`/`abort()`, so no lock is held here.
        match &outcome {
            Ok(value) => self.spec.notify_success(value),
            Err(error) if error.is_abort() => {}
            Err(error) => self.spec.notify_error(error),
        }

        let slot = self.lock_slot();
        if slot.generation == generation {
            self.state.send_modify(|s| s.is_loading = false);
        }
    }
}

impl<T> Drop for ControllerInner<T> {
    fn drop(&mut self) {
        // Last handle gone: nothing can observe a settlement anymore, so let
        // a cooperative in-flight operation stop.
        let slot = self.slot.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = slot.token.take() {
            token.cancel();
        }
    }
}

/// Races the operation against its abort token and settles exactly once.
///
/// Holds only a weak reference to the controller: when every handle is gone
/// before settlement, the outcome has no observer and is discarded. On abort
/// the operation task is left to its own devices; its child token is already
/// cancelled, and honoring it is the operation's job.
async fn drive<T: Clone + Send + Sync + 'static>(
    weak: Weak<ControllerInner<T>>,
    generation: u64,
    token: CancellationToken,
    handle: JoinHandle<Result<T, TaskError>>,
) {
    let outcome = tokio::select! {
        biased;
        _ = token.cancelled() => Err(TaskError::Aborted),
        joined = handle => match joined {
            Ok(result) => result,
            Err(join_err) => Err(TaskError::Failed {
                error: format!("operation panicked: {join_err}"),
            }),
        },
    };

    let Some(inner) = weak.upgrade() else { return };
    inner.settle(generation, outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::operation::{OperationFn, OperationRef};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    /// Waits until the controller is not loading and returns that snapshot.
    async fn settled<T: Clone + Send + Sync + 'static>(
        controller: &TaskController<T>,
    ) -> TaskSnapshot<T> {
        let mut rx = controller.watch();
        loop {
            let snap = rx.borrow_and_update().clone();
            if !snap.is_loading {
                return snap;
            }
            rx.changed().await.expect("controller state channel closed");
        }
    }

    #[tokio::test]
    async fn test_start_runs_to_success() {
        let op: OperationRef<String> = OperationFn::arc("ok", |_ctx| async {
            sleep(Duration::from_millis(5)).await;
            Ok("ok".to_string())
        });
        let controller = TaskController::start(TaskSpec::new(op));
        assert_eq!(controller.name(), "ok");

        let snap = settled(&controller).await;
        assert_eq!(snap.data.as_deref(), Some("ok"));
        assert!(snap.error.is_none());
        assert!(!snap.is_loading);
    }

    #[tokio::test]
    async fn test_closed_gate_makes_run_a_no_op() {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_op = Arc::clone(&runs);
        let op: OperationRef<u64> = OperationFn::arc("gated", move |_ctx| {
            let runs = Arc::clone(&runs_op);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            }
        });
        let spec = TaskSpec::builder(op).with_gate(|| false).build();

        let controller = TaskController::start(spec);
        controller.run();
        sleep(Duration::from_millis(30)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 0, "gated operation must never start");
        let snap = controller.snapshot();
        assert!(!snap.is_loading);
        assert!(snap.data.is_none());
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn test_abort_settles_silently() {
        let op: OperationRef<u64> = OperationFn::arc("slow", |_ctx| async {
            sleep(Duration::from_secs(60)).await;
            Ok(1)
        });
        let controller = TaskController::start(TaskSpec::new(op));
        assert!(controller.snapshot().is_loading);

        controller.abort();
        let snap = settled(&controller).await;
        assert!(snap.data.is_none(), "abort must not produce data");
        assert!(snap.error.is_none(), "abort must not surface an error");
        assert!(!snap.is_loading);
    }

    #[tokio::test]
    async fn test_abort_preserves_existing_data() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_op = Arc::clone(&calls);
        let op: OperationRef<String> = OperationFn::arc("paged", move |_ctx| {
            let call = calls_op.fetch_add(1, Ordering::SeqCst);
            async move {
                match call {
                    0 => Ok("cached".to_string()),
                    _ => {
                        sleep(Duration::from_secs(60)).await;
                        Ok("never".to_string())
                    }
                }
            }
        });
        let controller = TaskController::start(TaskSpec::new(op));

        let snap = settled(&controller).await;
        assert_eq!(snap.data.as_deref(), Some("cached"));

        controller.run();
        assert!(controller.snapshot().is_loading);
        controller.abort();

        let snap = settled(&controller).await;
        assert_eq!(snap.data.as_deref(), Some("cached"), "abort must keep earlier data");
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn test_operation_returning_aborted_is_silent() {
        let op: OperationRef<u64> =
            OperationFn::arc("self-abort", |_ctx| async { Err(TaskError::Aborted) });
        let controller = TaskController::start(TaskSpec::new(op));

        let snap = settled(&controller).await;
        assert!(snap.data.is_none());
        assert!(snap.error.is_none(), "cooperative abort must stay silent");
    }

    #[tokio::test]
    async fn test_failure_surfaces_error_and_keeps_data() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_op = Arc::clone(&calls);
        let op: OperationRef<String> = OperationFn::arc("flaky", move |_ctx| {
            let call = calls_op.fetch_add(1, Ordering::SeqCst);
            async move {
                match call {
                    0 => Ok("first".to_string()),
                    _ => Err(TaskError::Failed { error: "boom".into() }),
                }
            }
        });

        let errors = Arc::new(AtomicUsize::new(0));
        let errors_hook = Arc::clone(&errors);
        let spec = TaskSpec::builder(op)
            .on_error(move |_| {
                errors_hook.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        let controller = TaskController::start(spec);
        let snap = settled(&controller).await;
        assert_eq!(snap.data.as_deref(), Some("first"));

        controller.run();
        let snap = settled(&controller).await;
        assert_eq!(
            snap.error,
            Some(TaskError::Failed { error: "boom".into() })
        );
        assert_eq!(snap.data.as_deref(), Some("first"), "failure must not clear data");
        assert_eq!(errors.load(Ordering::SeqCst), 1, "error hook must fire exactly once");
    }

    #[tokio::test]
    async fn test_new_run_clears_previous_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_op = Arc::clone(&calls);
        let op: OperationRef<String> = OperationFn::arc("recovering", move |_ctx| {
            let call = calls_op.fetch_add(1, Ordering::SeqCst);
            async move {
                match call {
                    0 => Err(TaskError::Failed { error: "down".into() }),
                    _ => Ok("fine".to_string()),
                }
            }
        });
        let controller = TaskController::start(TaskSpec::new(op));

        let snap = settled(&controller).await;
        assert!(snap.error.is_some());

        controller.run();
        let snap = settled(&controller).await;
        assert!(snap.error.is_none(), "a new execution must clear the old error");
        assert_eq!(snap.data.as_deref(), Some("fine"));
    }

    #[tokio::test]
    async fn test_success_hook_receives_value() {
        let (tx, rx) = tokio::sync::oneshot::channel::<String>();
        let tx = Arc::new(Mutex::new(Some(tx)));

        let op: OperationRef<String> =
            OperationFn::arc("greet", |_ctx| async { Ok("hello".to_string()) });
        let spec = TaskSpec::builder(op)
            .on_success(move |value: &String| {
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(value.clone());
                }
            })
            .build();

        let _controller = TaskController::start(spec);
        assert_eq!(rx.await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_overlapping_runs_latest_settlement_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_op = Arc::clone(&calls);
        let op: OperationRef<String> = OperationFn::arc("racing", move |_ctx| {
            let call = calls_op.fetch_add(1, Ordering::SeqCst);
            async move {
                match call {
                    0 => {
                        sleep(Duration::from_millis(100)).await;
                        Ok("first".to_string())
                    }
                    _ => {
                        sleep(Duration::from_millis(10)).await;
                        Ok("second".to_string())
                    }
                }
            }
        });

        let controller = TaskController::start(TaskSpec::new(op));
        controller.run();

        let snap = settled(&controller).await;
        assert_eq!(snap.data.as_deref(), Some("second"));

        // Let the first run settle stale; the snapshot must not change.
        sleep(Duration::from_millis(200)).await;
        let snap = controller.snapshot();
        assert_eq!(snap.data.as_deref(), Some("second"), "stale settlement overwrote the snapshot");
        assert!(!snap.is_loading);
    }

    #[tokio::test]
    async fn test_retry_from_error_hook_keeps_loading_up() {
        let calls = Arc::new(AtomicUsize::new(0));
        let retry_started = Arc::new(AtomicBool::new(false));

        let calls_op = Arc::clone(&calls);
        let started_op = Arc::clone(&retry_started);
        let op: OperationRef<u64> = OperationFn::arc("retrying", move |_ctx| {
            let call = calls_op.fetch_add(1, Ordering::SeqCst);
            let started = Arc::clone(&started_op);
            async move {
                match call {
                    0 => Err(TaskError::Failed { error: "first attempt".into() }),
                    _ => {
                        started.store(true, Ordering::SeqCst);
                        sleep(Duration::from_secs(60)).await;
                        Ok(1)
                    }
                }
            }
        });

        // The hook retries through a handle stored after start().
        let handle_cell: Arc<Mutex<Option<TaskController<u64>>>> = Arc::new(Mutex::new(None));
        let retry_handle = Arc::clone(&handle_cell);
        let spec = TaskSpec::builder(op)
            .on_error(move |_| {
                if let Some(controller) = retry_handle.lock().unwrap().as_ref() {
                    controller.run();
                }
            })
            .build();

        let controller = TaskController::start(spec);
        *handle_cell.lock().unwrap() = Some(controller.clone());

        for _ in 0..200 {
            if retry_started.load(Ordering::SeqCst) {
                break;
            }
            sleep(Duration::from_millis(5)).await;
        }
        assert!(retry_started.load(Ordering::SeqCst), "hook never retried");

        // The first settlement closed after the retry was accepted; the
        // loading flag now belongs to the retry.
        let snap = controller.snapshot();
        assert!(snap.is_loading, "loading must stay up for the run started by the hook");
        assert!(snap.error.is_none(), "the accepted retry must clear the error");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        controller.abort();
    }

    #[tokio::test]
    async fn test_abort_cancels_only_latest_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cancelled = Arc::new(Mutex::new(vec![false, false]));

        let calls_op = Arc::clone(&calls);
        let cancelled_op = Arc::clone(&cancelled);
        let op: OperationRef<u64> = OperationFn::arc("pair", move |ctx: CancellationToken| {
            let call = calls_op.fetch_add(1, Ordering::SeqCst);
            let cancelled = Arc::clone(&cancelled_op);
            async move {
                tokio::select! {
                    _ = ctx.cancelled() => {
                        cancelled.lock().unwrap()[call] = true;
                        Err(TaskError::Aborted)
                    }
                    _ = sleep(Duration::from_millis(100)) => Ok(call as u64),
                }
            }
        });

        let controller = TaskController::start(TaskSpec::new(op));
        controller.run();
        controller.abort();

        let snap = settled(&controller).await;
        assert!(snap.data.is_none());
        assert!(snap.error.is_none());

        sleep(Duration::from_millis(150)).await;
        let flags = cancelled.lock().unwrap().clone();
        assert!(!flags[0], "abort must not reach the older run's token");
        assert!(flags[1], "abort must cancel the latest run's token");

        // The older run settled stale; its success must not surface.
        assert!(controller.snapshot().data.is_none());
    }

    #[tokio::test]
    async fn test_panicking_operation_settles_as_failure() {
        let op: OperationRef<u64> =
            OperationFn::arc("exploding", |_ctx| async { panic!("kaboom") });
        let controller = TaskController::start(TaskSpec::new(op));

        let snap = settled(&controller).await;
        assert!(!snap.is_loading);
        let error = snap.error.expect("panic must surface as a failure");
        assert_eq!(error.as_label(), "task_failed");
        assert!(
            error.as_message().contains("panicked"),
            "unexpected message: {}",
            error.as_message()
        );
    }

    #[tokio::test]
    async fn test_panicking_success_hook_still_settles() {
        let op: OperationRef<u64> = OperationFn::arc("noisy", |_ctx| async { Ok(7) });
        let spec = TaskSpec::builder(op)
            .on_success(|_| panic!("hook blew up"))
            .build();
        let controller = TaskController::start(spec);

        let snap = settled(&controller).await;
        assert!(!snap.is_loading, "loading must close even when the success hook panics");
        assert_eq!(snap.data, Some(7));
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn test_drop_cancels_live_token() {
        let saw_cancel = Arc::new(AtomicBool::new(false));
        let saw_cancel_op = Arc::clone(&saw_cancel);
        let op: OperationRef<u64> = OperationFn::arc("lingering", move |ctx: CancellationToken| {
            let saw_cancel = Arc::clone(&saw_cancel_op);
            async move {
                ctx.cancelled().await;
                saw_cancel.store(true, Ordering::SeqCst);
                Err(TaskError::Aborted)
            }
        });

        let controller = TaskController::start(TaskSpec::new(op));
        drop(controller);

        sleep(Duration::from_millis(30)).await;
        assert!(
            saw_cancel.load(Ordering::SeqCst),
            "dropping the last handle must cancel the live token"
        );
    }

    #[tokio::test]
    async fn test_clone_observes_and_drives_same_state() {
        let op: OperationRef<u64> = OperationFn::arc("shared", |_ctx| async {
            sleep(Duration::from_secs(60)).await;
            Ok(1)
        });
        let controller = TaskController::start(TaskSpec::new(op));
        let other = controller.clone();

        assert!(other.snapshot().is_loading);
        other.abort();

        let snap = settled(&controller).await;
        assert!(!snap.is_loading);
        assert!(snap.error.is_none());
    }
}
