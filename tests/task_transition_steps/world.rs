//! Shared world state for task transition BDD scenarios.

use std::sync::Arc;

use atelier::task::{
    adapters::memory::InMemoryHierarchyRepository,
    domain::TaskKey,
    services::{StatusChange, TaskLifecycleError, TaskLifecycleService},
};
use atelier::workflow::domain::WorkflowDefinition;
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestTaskService = TaskLifecycleService<InMemoryHierarchyRepository, DefaultClock>;

/// Scenario world for transition behaviour tests.
pub struct TransitionWorld {
    pub service: TestTaskService,
    pub last_task: Option<TaskKey>,
    pub last_result: Option<Result<StatusChange, TaskLifecycleError>>,
}

impl TransitionWorld {
    /// Creates a world over an empty repository and the built-in workflow.
    #[must_use]
    pub fn new() -> Self {
        let service = TaskLifecycleService::new(
            Arc::new(InMemoryHierarchyRepository::new()),
            Arc::new(WorkflowDefinition::builtin()),
            Arc::new(DefaultClock),
        );

        Self {
            service,
            last_task: None,
            last_result: None,
        }
    }
}

impl Default for TransitionWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TransitionWorld {
    TransitionWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Parses a task key supplied by a scenario.
///
/// # Errors
///
/// Returns an error when the key is blank or contains whitespace.
pub fn parse_task(value: &str) -> Result<TaskKey, eyre::Report> {
    TaskKey::new(value).map_err(|err| eyre::eyre!("invalid task key in scenario: {err}"))
}
