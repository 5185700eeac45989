//! # Readable task state.
//!
//! [`TaskSnapshot`] is the plain value an observer needs to render one task's
//! lifecycle: last result, in-flight flag, last surfaced failure. Snapshots
//! are produced by [`TaskController`](crate::TaskController) and delivered
//! through its watch channel; they carry no handles and are cheap to clone.

use crate::error::TaskError;

/// Observable state of one task controller.
///
/// Field semantics:
/// - `data` survives later failures and aborts; only the next natural success
///   replaces it.
/// - `is_loading` is true strictly between an accepted `run()` and its
///   settlement (success, failure, or abort).
/// - `error` is cleared when a new execution starts and never set by an abort.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot<T> {
    /// Last successful result, if any.
    pub data: Option<T>,
    /// True while an accepted execution is in flight.
    pub is_loading: bool,
    /// Last surfaced failure, if any.
    pub error: Option<TaskError>,
}

impl<T> Default for TaskSnapshot<T> {
    /// Returns the idle snapshot: no data, not loading, no error.
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }
}
