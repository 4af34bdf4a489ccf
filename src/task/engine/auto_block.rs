//! Blocking of downstream work when a prerequisite is reopened.

use super::DependencyGraph;
use crate::task::domain::{Task, TaskId, TaskKey};
use crate::workflow::domain::WorkflowDefinition;
use std::collections::BTreeMap;
use tracing::debug;

/// Instruction to block one dependent task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDirective {
    /// Task to block.
    pub task_id: TaskId,
    /// Key of the task to block.
    pub key: TaskKey,
    /// Reason recorded on the task and its history row.
    pub reason: String,
}

/// Computes which dependents must be blocked after a reopen.
#[derive(Debug, Clone, Copy)]
pub struct AutoBlockPropagator<'a> {
    workflow: &'a WorkflowDefinition,
}

impl<'a> AutoBlockPropagator<'a> {
    /// Creates a propagator for the workflow.
    #[must_use]
    pub const fn new(workflow: &'a WorkflowDefinition) -> Self {
        Self { workflow }
    }

    /// Returns the dependents of `reopened` that should be blocked.
    ///
    /// Every transitive dependent is visited once. Terminal dependents are
    /// left alone, but tasks further downstream of them are still
    /// considered. Dependents that are already blocked are included so the
    /// new reason replaces the old one. Returns nothing when the workflow
    /// defines no blocked status.
    #[must_use]
    pub fn propagate(&self, reopened: &TaskKey, population: &[Task]) -> Vec<BlockDirective> {
        if self.workflow.blocked_status().is_none() {
            debug!(task = %reopened, "workflow has no blocked status, skipping propagation");
            return Vec::new();
        }

        let by_key: BTreeMap<&TaskKey, &Task> =
            population.iter().map(|task| (task.key(), task)).collect();
        let graph = DependencyGraph::from_tasks(population);
        let reason = block_reason(reopened);

        graph
            .transitive_dependents(reopened)
            .into_iter()
            .filter_map(|key| by_key.get(&key).copied())
            .filter(|task| !task.is_terminal(self.workflow))
            .map(|task| BlockDirective {
                task_id: task.id(),
                key: task.key().clone(),
                reason: reason.clone(),
            })
            .collect()
    }
}

/// Reason attached to tasks blocked because `prerequisite` was reopened.
#[must_use]
pub fn block_reason(prerequisite: &TaskKey) -> String {
    format!("Prerequisite task {prerequisite} was reopened")
}
