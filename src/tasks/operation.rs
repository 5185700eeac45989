//! # Operation abstraction and function-backed implementation.
//!
//! This module defines the [`Operation`] trait (async, cancellable, value-producing)
//! and a convenient function-backed implementation [`OperationFn`]. The common
//! handle type is [`OperationRef`], an `Arc<dyn Operation<T>>` suitable for sharing
//! with a controller.
//!
//! An operation receives a [`CancellationToken`] and should periodically check it
//! to stop cooperatively after an abort.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to an operation (`Arc<dyn Operation<T>>`).
pub type OperationRef<T> = Arc<dyn Operation<T>>;

/// # Asynchronous, cancellable unit producing a value.
///
/// An `Operation` has a stable [`name`](Operation::name) and an async
/// [`run`](Operation::run) method that receives a [`CancellationToken`] and
/// resolves to a value or a [`TaskError`].
///
/// The token is a child of the controller's abort handle for one execution.
/// Implementors should check it at natural pause points and return
/// [`TaskError::Aborted`] promptly; an operation that never checks cannot be
/// stopped early and keeps running unobserved after an abort.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use statevisor::{Operation, TaskError};
///
/// struct FetchCount;
///
/// #[async_trait]
/// impl Operation<u64> for FetchCount {
///     fn name(&self) -> &str { "fetch_count" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<u64, TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Aborted);
///         }
///         // do work...
///         Ok(42)
///     }
/// }
/// ```
#[async_trait]
pub trait Operation<T>: Send + Sync + 'static {
    /// Returns a stable, human-readable operation name.
    fn name(&self) -> &str;

    /// Executes the operation until completion, failure, or cancellation.
    ///
    /// Returning [`TaskError::Aborted`] counts as a cooperative abort and is
    /// settled silently, exactly like an external [`abort`](crate::TaskController::abort).
    async fn run(&self, ctx: CancellationToken) -> Result<T, TaskError>;
}

/// Function-backed operation implementation.
///
/// Wraps a closure that *creates* a new future per execution, so repeated
/// `run()` calls on a controller never share hidden mutable state. Shared
/// state, when needed, goes through an explicit `Arc<...>` inside the closure.
pub struct OperationFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> OperationFn<F> {
    /// Creates a new function-backed operation.
    ///
    /// Prefer [`OperationFn::arc`] when you immediately need an [`OperationRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the operation and returns it as a shared handle.
    ///
    /// ## Example
    /// ```
    /// use tokio_util::sync::CancellationToken;
    /// use statevisor::{OperationFn, OperationRef, TaskError};
    ///
    /// let op: OperationRef<String> = OperationFn::arc("greet", |_ctx: CancellationToken| async {
    ///     Ok::<_, TaskError>("hello".to_string())
    /// });
    /// assert_eq!(op.name(), "greet");
    /// ```
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut, T> Operation<T> for OperationFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    T: Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<T, TaskError> {
        (self.f)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_operation_fn_runs_and_names() {
        let op: OperationRef<u64> =
            OperationFn::arc("answer", |_ctx: CancellationToken| async { Ok(42) });
        assert_eq!(op.name(), "answer");

        let out = op.run(CancellationToken::new()).await;
        assert_eq!(out.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_operation_fn_builds_fresh_future_per_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_op = Arc::clone(&calls);
        let op: OperationRef<usize> = OperationFn::arc("counting", move |_ctx| {
            let calls = Arc::clone(&calls_op);
            async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) }
        });

        assert_eq!(op.run(CancellationToken::new()).await.unwrap(), 1);
        assert_eq!(op.run(CancellationToken::new()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_operation_observes_cancelled_token() {
        let op: OperationRef<u64> = OperationFn::arc("gated", |ctx: CancellationToken| async move {
            if ctx.is_cancelled() {
                return Err(TaskError::Aborted);
            }
            Ok(1)
        });

        let token = CancellationToken::new();
        token.cancel();
        let out = op.run(token).await;
        assert!(out.unwrap_err().is_abort());
    }
}
