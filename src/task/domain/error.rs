//! Error types for work hierarchy validation and parsing.

use super::TaskKey;
use thiserror::Error;

/// Errors returned while constructing domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// A key is blank or contains whitespace.
    #[error("invalid {kind} key '{value}'")]
    InvalidKey {
        /// Entity kind the key identifies.
        kind: &'static str,
        /// Rejected key.
        value: String,
    },

    /// A title is empty after trimming.
    #[error("title must not be empty")]
    EmptyTitle,

    /// An execution order is not a positive 32-bit integer.
    #[error("invalid execution order {0}, expected a positive integer")]
    InvalidExecutionOrder(i64),

    /// A status is not defined by the active workflow.
    #[error("unknown status '{0}'")]
    UnknownStatus(String),
}

/// Error returned while parsing container statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown container status: {0}")]
pub struct ParseContainerStatusError(pub String);

/// Rejections from the status transition validator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The target status is not defined by the workflow.
    #[error("task {task}: unknown status '{status}'")]
    UnknownStatus {
        /// Task being transitioned.
        task: TaskKey,
        /// Rejected target status.
        status: String,
    },

    /// The workflow does not allow moving between the two statuses.
    #[error(
        "task {task}: cannot move from '{from}' to '{to}' (allowed: {})",
        format_allowed(.allowed)
    )]
    IllegalTransition {
        /// Task being transitioned.
        task: TaskKey,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
        /// Statuses reachable from `from`.
        allowed: Vec<String>,
    },

    /// A backward move was requested without a justification.
    #[error("task {task}: moving back from '{from}' to '{to}' requires a reason")]
    ReasonRequired {
        /// Task being transitioned.
        task: TaskKey,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// A reopen was requested for a move that does not reopen work.
    #[error("task {task}: moving from '{from}' to '{to}' does not reopen the task")]
    NotAReopen {
        /// Task being reopened.
        task: TaskKey,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// The workflow does not declare a blocked status.
    #[error("task {task}: the workflow has no blocked status")]
    NoBlockedStatus {
        /// Task being blocked or unblocked.
        task: TaskKey,
    },

    /// Unblocking was requested for a task that is not blocked.
    #[error("task {task} is not blocked (status '{status}')")]
    NotBlocked {
        /// Task being unblocked.
        task: TaskKey,
        /// Current status.
        status: String,
    },
}

fn format_allowed(allowed: &[String]) -> String {
    if allowed.is_empty() {
        return "none".to_owned();
    }
    allowed.join(", ")
}

/// Integrity violations in a task's declared dependencies.
///
/// None of these can be bypassed with a forced request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DependencyError {
    /// The dependency list is not a list of non-blank task keys.
    #[error("task {task}: malformed dependency list: {reason}")]
    MalformedDependencies {
        /// Task whose dependencies were supplied.
        task: String,
        /// Parse failure description.
        reason: String,
    },

    /// A task lists itself as a dependency.
    #[error("task {task} cannot depend on itself")]
    SelfDependency {
        /// Offending task.
        task: TaskKey,
    },

    /// A dependency names a task that does not exist.
    #[error("task {task}: dependency {dependency} does not exist")]
    DependencyNotFound {
        /// Task whose dependencies were supplied.
        task: TaskKey,
        /// Missing prerequisite.
        dependency: TaskKey,
    },

    /// The dependency set would close a cycle.
    #[error("task {task}: circular dependency {}", format_cycle(.cycle))]
    CircularDependency {
        /// Task whose dependencies were supplied.
        task: TaskKey,
        /// Cycle path, starting and ending at `task`.
        cycle: Vec<TaskKey>,
    },
}

fn format_cycle(cycle: &[TaskKey]) -> String {
    cycle
        .iter()
        .map(TaskKey::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
