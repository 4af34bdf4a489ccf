//! Application services for the work hierarchy.
//!
//! [`TaskLifecycleService`] exposes every hierarchy operation. Its methods
//! are grouped by concern across the submodules; each one opens a single
//! repository transaction.

mod dependencies;
mod error;
mod hierarchy;
mod lifecycle;
mod ordering;
mod progress;
mod support;

pub use error::{TaskLifecycleError, TaskLifecycleResult};
pub use hierarchy::CreateTaskRequest;
pub use lifecycle::{StatusChange, TaskLifecycleService};
