//! Error types for workflow definition loading and validation.

use thiserror::Error;

/// Errors returned while building or querying a workflow definition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// The document declares a schema version this crate cannot read.
    #[error("unsupported workflow version {0} (supported: 1.0)")]
    UnsupportedVersion(String),

    /// A required special status list is missing or empty.
    #[error("missing required special status '{0}'")]
    MissingSpecialStatus(String),

    /// A special status entry names a status absent from `status_flow`.
    #[error("{role} status '{status}' is not defined in status_flow")]
    UndefinedSpecialStatus {
        /// Special status key, for example `_start_`.
        role: String,
        /// Offending status name.
        status: String,
    },

    /// One or more transitions target statuses absent from `status_flow`.
    #[error("undefined status references in transitions: {}", .0.join(", "))]
    UndefinedTransitionTargets(Vec<String>),

    /// Some statuses cannot be reached from any start status.
    #[error("unreachable statuses (no path from _start_): {}", .0.join(", "))]
    UnreachableStatuses(Vec<String>),

    /// Some statuses have no path to a complete status.
    #[error("dead-end statuses (no path to _complete_): {}", .0.join(", "))]
    DeadEndStatuses(Vec<String>),

    /// Status metadata references a status absent from `status_flow`.
    #[error("status_metadata entry '{0}' is not defined in status_flow")]
    UndefinedMetadataStatus(String),

    /// A status name is empty after trimming.
    #[error("status names must not be empty")]
    EmptyStatusName,

    /// The phase order lists the same phase more than once.
    #[error("phase '{0}' appears more than once in phase_order")]
    DuplicatePhase(String),

    /// A progress weight lies outside `0.0..=1.0`.
    #[error("progress_weight for status '{status}' must be within 0.0..=1.0")]
    InvalidProgressWeight {
        /// Status carrying the invalid weight.
        status: String,
    },

    /// An orchestrator action is misconfigured.
    #[error("invalid orchestrator action for status '{status}' ({field}): {problem}")]
    InvalidOrchestratorAction {
        /// Status owning the action.
        status: String,
        /// Offending field name.
        field: String,
        /// Human-readable description of the problem.
        problem: String,
    },

    /// Rendering an orchestrator instruction template failed.
    #[error("failed to render orchestrator instruction for status '{status}': {reason}")]
    TemplateRender {
        /// Status owning the template.
        status: String,
        /// Underlying renderer message.
        reason: String,
    },

    /// The workflow document could not be read or parsed.
    #[error("failed to load workflow document from {path}: {reason}")]
    Load {
        /// Location of the document.
        path: String,
        /// Underlying I/O or parse error message.
        reason: String,
    },
}
