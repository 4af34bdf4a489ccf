//! Port contracts for workflow configuration.

pub mod source;

pub use source::WorkflowSource;
