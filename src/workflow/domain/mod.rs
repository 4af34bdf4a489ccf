//! Domain model for configurable status workflows.
//!
//! A workflow is a directed graph of status names with per-status metadata.
//! Statuses are plain strings checked against the loaded definition rather
//! than a closed enumeration, so projects can change their workflow without
//! recompiling.

mod action;
mod defaults;
mod definition;
mod document;
mod error;
mod validation;

pub use action::{OrchestratorAction, PopulatedAction, VALID_ACTION_KINDS};
pub use defaults::{DEFAULT_PHASE_ORDER, default_document};
pub use definition::{ACTIVE_PHASE, WorkflowDefinition};
pub use document::{
    AWAITING_APPROVAL_STATUS_KEY, BLOCKED_STATUS_KEY, COMPLETE_STATUS_KEY,
    DEFAULT_WORKFLOW_VERSION, START_STATUS_KEY, StatusMetadata, WorkflowDocument,
};
pub use error::WorkflowError;
pub use validation::validate_document;
