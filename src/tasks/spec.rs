//! # Task specification: operation plus execution policy.
//!
//! Defines [`TaskSpec`], a configuration bundle describing what a controller
//! runs and how: the operation itself, an execution gate, and optional
//! settlement callbacks.
//!
//! A spec can be created:
//! - **Plain** with [`TaskSpec::new`] (gate always open, no callbacks)
//! - **Fluently** with [`TaskSpec::builder`]
//!
//! ## Rules
//! - The gate is re-evaluated at every [`run`](crate::TaskController::run)
//!   call; a closed gate makes the call a complete no-op.
//! - Callbacks fire on settlement only: the success callback on natural
//!   success, the error callback on failure. Aborts fire neither.
//! - A panicking callback is caught and reported; it cannot poison the
//!   controller.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::error::TaskError;
use crate::tasks::operation::OperationRef;

type Gate = Arc<dyn Fn() -> bool + Send + Sync>;
type SuccessHook<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&TaskError) + Send + Sync>;

/// Specification for running an operation under a controller.
///
/// Bundles together:
/// - The operation itself ([`OperationRef`])
/// - An execution gate (`Fn() -> bool`, checked on every `run()`)
/// - Optional success/error callbacks
///
/// ## Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use tokio_util::sync::CancellationToken;
/// use statevisor::{OperationFn, OperationRef, TaskError, TaskSpec};
///
/// let enabled = Arc::new(AtomicBool::new(true));
/// let gate = Arc::clone(&enabled);
///
/// let op: OperationRef<String> = OperationFn::arc("fetch", |_ctx: CancellationToken| async {
///     Ok::<_, TaskError>("payload".to_string())
/// });
///
/// let spec = TaskSpec::builder(op)
///     .with_gate(move || gate.load(Ordering::SeqCst))
///     .on_success(|value| println!("got {value}"))
///     .on_error(|err| eprintln!("failed: {err}"))
///     .build();
///
/// assert_eq!(spec.name(), "fetch");
/// assert!(spec.should_execute());
///
/// enabled.store(false, Ordering::SeqCst);
/// assert!(!spec.should_execute());
/// ```
pub struct TaskSpec<T> {
    operation: OperationRef<T>,
    gate: Gate,
    on_success: Option<SuccessHook<T>>,
    on_error: Option<ErrorHook>,
}

impl<T> Clone for TaskSpec<T> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
            gate: Arc::clone(&self.gate),
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<T: 'static> TaskSpec<T> {
    /// Creates a specification with defaults: gate always open, no callbacks.
    pub fn new(operation: OperationRef<T>) -> Self {
        Self {
            operation,
            gate: Arc::new(|| true),
            on_success: None,
            on_error: None,
        }
    }

    /// Starts a fluent builder around `operation`.
    pub fn builder(operation: OperationRef<T>) -> TaskSpecBuilder<T> {
        TaskSpecBuilder {
            spec: Self::new(operation),
        }
    }

    /// Returns a reference to the operation.
    pub fn operation(&self) -> &OperationRef<T> {
        &self.operation
    }

    /// Convenience: returns the operation name.
    pub fn name(&self) -> &str {
        self.operation.name()
    }

    /// Evaluates the gate; `false` means `run()` must be a no-op right now.
    pub fn should_execute(&self) -> bool {
        (self.gate)()
    }

    /// Invokes the success callback, if any, isolating panics.
    pub(crate) fn notify_success(&self, value: &T) {
        if let Some(hook) = &self.on_success {
            if let Err(panic_err) = catch_unwind(AssertUnwindSafe(|| hook(value))) {
                eprintln!(
                    "[statevisor] success callback for '{}' panicked: {panic_err:?}",
                    self.name()
                );
            }
        }
    }

    /// Invokes the error callback, if any, isolating panics.
    pub(crate) fn notify_error(&self, error: &TaskError) {
        if let Some(hook) = &self.on_error {
            if let Err(panic_err) = catch_unwind(AssertUnwindSafe(|| hook(error))) {
                eprintln!(
                    "[statevisor] error callback for '{}' panicked: {panic_err:?}",
                    self.name()
                );
            }
        }
    }
}

/// Fluent builder for [`TaskSpec`].
pub struct TaskSpecBuilder<T> {
    spec: TaskSpec<T>,
}

impl<T> TaskSpecBuilder<T> {
    /// Sets the execution gate (default: always open).
    ///
    /// Checked at every `run()` call, including the automatic one at
    /// controller creation.
    pub fn with_gate(mut self, gate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.spec.gate = Arc::new(gate);
        self
    }

    /// Sets the callback invoked with the value on natural success.
    pub fn on_success(mut self, hook: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.spec.on_success = Some(Arc::new(hook));
        self
    }

    /// Sets the callback invoked with the error on failure (never on abort).
    pub fn on_error(mut self, hook: impl Fn(&TaskError) + Send + Sync + 'static) -> Self {
        self.spec.on_error = Some(Arc::new(hook));
        self
    }

    /// Finalizes the specification.
    pub fn build(self) -> TaskSpec<T> {
        self.spec
    }
}
