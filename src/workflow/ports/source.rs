//! Port for obtaining the active workflow definition.

use crate::workflow::domain::{WorkflowDefinition, WorkflowError};

/// Supplies a validated workflow definition.
///
/// Implementations fall back to [`WorkflowDefinition::builtin`] when no
/// workflow has been configured.
pub trait WorkflowSource: Send + Sync {
    /// Loads the workflow definition.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when a configured workflow cannot be read,
    /// parsed or validated.
    fn load(&self) -> Result<WorkflowDefinition, WorkflowError>;
}
