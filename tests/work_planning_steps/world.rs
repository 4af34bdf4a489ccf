//! Shared world state for work planning BDD scenarios.

use std::sync::Arc;

use atelier::task::{
    adapters::memory::InMemoryHierarchyRepository,
    domain::{FeatureKey, Task, TaskKey},
    services::{TaskLifecycleError, TaskLifecycleService},
};
use atelier::workflow::domain::WorkflowDefinition;
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestPlanningService = TaskLifecycleService<InMemoryHierarchyRepository, DefaultClock>;

/// Scenario world for planning behaviour tests.
pub struct PlanningWorld {
    pub service: TestPlanningService,
    pub last_update: Option<Result<Task, TaskLifecycleError>>,
}

impl PlanningWorld {
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
            last_update: None,
        }
    }
}

impl Default for PlanningWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> PlanningWorld {
    PlanningWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Splits a comma-separated scenario list into trimmed entries.
pub fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|entry| !entry.is_empty())
}

/// Parses a task key supplied by a scenario.
///
/// # Errors
///
/// Returns an error when the key is blank or contains whitespace.
pub fn parse_task(value: &str) -> Result<TaskKey, eyre::Report> {
    TaskKey::new(value).map_err(|err| eyre::eyre!("invalid task key in scenario: {err}"))
}

/// Parses a feature key supplied by a scenario.
///
/// # Errors
///
/// Returns an error when the key is blank or contains whitespace.
pub fn parse_feature(value: &str) -> Result<FeatureKey, eyre::Report> {
    FeatureKey::new(value).map_err(|err| eyre::eyre!("invalid feature key in scenario: {err}"))
}
