//! # Tasks: cancellable operations and their controllers.
//!
//! This module provides the core task-related types:
//! - [`Operation`] - trait for implementing async cancellable, value-producing work
//! - [`OperationFn`] - function-based operation implementation
//! - [`OperationRef`] - shared reference to an operation (`Arc<dyn Operation<T>>`)
//! - [`TaskSpec`] - specification bundling an operation with its execution policy
//! - [`TaskController`] - runs a spec: abortable, observable as [`TaskSnapshot`]

mod controller;
mod operation;
mod snapshot;
mod spec;

pub use controller::TaskController;
pub use operation::{Operation, OperationFn, OperationRef};
pub use snapshot::TaskSnapshot;
pub use spec::{TaskSpec, TaskSpecBuilder};
