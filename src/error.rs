//! Error types used by the statevisor store and task controllers.
//!
//! This module defines two main error enums:
//!
//! - [`StoreError`] - errors raised by observable store operations.
//! - [`TaskError`] - errors raised by individual task executions.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics
//! and additional utilities such as [`TaskError::is_abort`].

use thiserror::Error;

/// # Errors produced by the observable store.
///
/// These represent misuse of the store surface, such as reading or writing
/// a key that was never ensured. They are surfaced synchronously and never
/// swallowed: an unknown key is a programmer error, not a runtime condition.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Operation referenced a key with no entry (no `ensure` call ever created it).
    #[error("unknown key: {key:?} (no entry was ever ensured)")]
    UnknownKey {
        /// The key that was looked up.
        key: String,
    },
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use statevisor::StoreError;
    ///
    /// let err = StoreError::UnknownKey { key: "count".into() };
    /// assert_eq!(err.as_label(), "store_unknown_key");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::UnknownKey { .. } => "store_unknown_key",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StoreError::UnknownKey { key } => format!("unknown key: {key}"),
        }
    }
}

/// # Errors produced by task execution.
///
/// These represent the two ways an execution can settle unsuccessfully:
/// an external or cooperative abort (expected, kept silent), or a genuine
/// failure of the operation (surfaced to the snapshot and the error callback).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Execution was aborted before the operation settled naturally.
    ///
    /// Never stored in a snapshot's `error` field and never passed to the
    /// error callback; an abort only ends the loading state.
    #[error("execution aborted")]
    Aborted,

    /// Operation failed (including an operation that panicked).
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use statevisor::TaskError;
    ///
    /// let err = TaskError::Failed { error: "boom".into() };
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Aborted => "task_aborted",
            TaskError::Failed { .. } => "task_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Aborted => "execution aborted".to_string(),
            TaskError::Failed { error } => format!("error: {error}"),
        }
    }

    /// Indicates whether the error is an abort.
    ///
    /// Aborts settle an execution silently: `true` here means the controller
    /// will not surface the error to observers or callbacks.
    ///
    /// # Example
    /// ```
    /// use statevisor::TaskError;
    ///
    /// assert!(TaskError::Aborted.is_abort());
    /// assert!(!TaskError::Failed { error: "boom".into() }.is_abort());
    /// ```
    pub fn is_abort(&self) -> bool {
        matches!(self, TaskError::Aborted)
    }
}
