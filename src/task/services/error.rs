//! Service-level errors.

use crate::task::{
    domain::{DependencyError, TaskDomainError, TransitionError},
    ports::HierarchyRepositoryError,
};
use crate::workflow::domain::WorkflowError;
use thiserror::Error;

/// Service-level errors for hierarchy operations.
#[derive(Debug, Clone, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The workflow rejected a status change.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// A dependency set failed validation.
    #[error(transparent)]
    Dependency(#[from] DependencyError),

    /// The workflow could not produce a result.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] HierarchyRepositoryError),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {key}")]
    EntityNotFound {
        /// Entity kind.
        entity: &'static str,
        /// Key that was looked up.
        key: String,
    },
}

impl TaskLifecycleError {
    /// Returns `true` when retrying the operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Repository(HierarchyRepositoryError::ConcurrentModification { .. })
        )
    }

    pub(super) fn not_found(entity: &'static str, key: &dyn std::fmt::Display) -> Self {
        Self::EntityNotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// Result type for hierarchy service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;
