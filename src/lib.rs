//! # statevisor
//!
//! **Statevisor** is a lightweight library of async behavior primitives for Rust.
//!
//! It provides the two stateful building blocks a reactive application keeps
//! reimplementing: a cancellable task executor with observable state, and a
//! process-wide observable key-value store with scoped subscriptions. The
//! crate is designed as a building block for UI shells, agents, and tools
//! that render state they do not own.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//!   │  KeyBinding  │     │  KeyBinding  │     │   listener   │
//!   │ (consumer A) │     │ (consumer B) │     │ (hand-rolled)│
//!   └──────┬───────┘     └──────┬───────┘     └──────┬───────┘
//!          │ attach/set         │ attach             │ subscribe
//!          ▼                    ▼                    ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │  Store<T>   (key → value + listeners, registration order)  │
//! │  - ensure: create entry once (the first default wins)      │
//! │  - set: overwrite + synchronous fan-out, outside the lock  │
//! └────────────────────────────────────────────────────────────┘
//!
//!   ┌──────────────┐  start    ┌──────────────────────────────┐
//!   │   TaskSpec   │──────────►│  TaskController<T>           │
//!   │ (operation + │ run/abort │  - generation slot + token   │
//!   │  gate+hooks) │──────────►│  - operation task (child tok)│
//!   └──────────────┘           │  - drive: op vs abort race   │
//!                              └──────────────┬───────────────┘
//!                                             │ watch channel
//!                                             ▼
//!                              TaskSnapshot { data, is_loading, error }
//!                                             │
//!                                             ▼
//!                                   spawn_snapshot_watcher
//! ```
//!
//! ### Execution lifecycle
//! ```text
//! run() ──► gate open? ──► generation += 1, fresh token
//!   │                            │
//!   │ (closed: no-op)            ▼
//!   │                  loading=true, error=None
//!   ▼                            │
//! settle (current generation only):
//!   ├─ success ──► data=value, on_success, loading=false
//!   ├─ failure ──► error=e,    on_error,   loading=false
//!   └─ abort   ──► loading=false                   (silent)
//!
//! Stale settlements (older generation) are dropped.
//! An operation ignoring its token keeps running unobserved after abort.
//! ```
//!
//! ## Features
//! | Area           | Description                                                      | Key types / traits                          |
//! |----------------|------------------------------------------------------------------|---------------------------------------------|
//! | **Store**      | Observable keyed state with synchronous, ordered fan-out.        | [`Store`], [`ListenerId`]                   |
//! | **Tasks**      | Define operations as traits or closures, run them cancellably.   | [`Operation`], [`OperationFn`], [`TaskSpec`]|
//! | **Controller** | One abortable execution at a time, state as snapshots.           | [`TaskController`], [`TaskSnapshot`]        |
//! | **Binding**    | Scoped subscriptions driving a re-render cycle.                  | [`KeyBinding`], [`spawn_snapshot_watcher`]  |
//! | **Errors**     | Typed errors for store misuse and task settlement.               | [`StoreError`], [`TaskError`]               |
//!
//! ## Optional features
//! - `logging`: exports simple stdout taps _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use statevisor::{
//!     KeyBinding, OperationFn, OperationRef, Store, TaskController, TaskError, TaskSpec,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Process-wide store: construct once, clone handles everywhere.
//!     let store: Store<u64> = Store::new();
//!     let counter = KeyBinding::attach(&store, "count", 0, |v| {
//!         println!("count re-rendered: {v}");
//!     })?;
//!     counter.set(1)?;
//!     assert_eq!(counter.latest(), 1);
//!
//!     // Cancellable task with observable state; creation runs it once.
//!     let op: OperationRef<String> = OperationFn::arc("fetch", |_ctx| async {
//!         Ok::<_, TaskError>("payload".to_string())
//!     });
//!     let controller = TaskController::start(TaskSpec::new(op));
//!
//!     let mut rx = controller.watch();
//!     loop {
//!         let snap = rx.borrow_and_update().clone();
//!         if !snap.is_loading {
//!             assert_eq!(snap.data.as_deref(), Some("payload"));
//!             break;
//!         }
//!         rx.changed().await?;
//!     }
//!     Ok(())
//! }
//! ```
mod binding;
mod error;
mod store;
mod tasks;

// ---- Public re-exports ----

pub use binding::{KeyBinding, spawn_snapshot_watcher};
pub use error::{StoreError, TaskError};
pub use store::{Listener, ListenerId, Store};
pub use tasks::{
    Operation, OperationFn, OperationRef, TaskController, TaskSnapshot, TaskSpec, TaskSpecBuilder,
};

// Optional: expose simple built-in logging taps (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod logging;
#[cfg(feature = "logging")]
pub use logging::{log_store_updates, log_task_transitions};
