//! Adapter implementations of the workflow source port.

pub mod builtin;
pub mod json_file;

pub use builtin::FixedWorkflowSource;
pub use json_file::{DEFAULT_WORKFLOW_PATH, JsonFileWorkflowSource};
