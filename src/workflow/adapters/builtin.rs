//! Workflow source that always returns a fixed definition.

use crate::workflow::{
    domain::{WorkflowDefinition, WorkflowError},
    ports::WorkflowSource,
};

/// Serves a preassembled definition, the built-in one by default.
#[derive(Debug, Clone, Default)]
pub struct FixedWorkflowSource {
    definition: WorkflowDefinition,
}

impl FixedWorkflowSource {
    /// Creates a source serving `definition`.
    #[must_use]
    pub const fn new(definition: WorkflowDefinition) -> Self {
        Self { definition }
    }
}

impl WorkflowSource for FixedWorkflowSource {
    fn load(&self) -> Result<WorkflowDefinition, WorkflowError> {
        Ok(self.definition.clone())
    }
}
