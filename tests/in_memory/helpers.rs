//! Shared test helpers for in-memory integration tests.

use std::sync::Arc;

use atelier::task::{
    adapters::memory::InMemoryHierarchyRepository,
    domain::{EpicKey, FeatureKey, Task, TaskKey},
    engine::TransitionRequest,
    services::{CreateTaskRequest, TaskLifecycleService},
};
use atelier::workflow::domain::WorkflowDefinition;
use eyre::WrapErr;
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the integration tests.
pub type TestService = TaskLifecycleService<InMemoryHierarchyRepository, DefaultClock>;

/// Service paired with the repository it writes to.
pub struct Harness {
    /// Service under test.
    pub service: TestService,
    /// Repository backing the service, for row counts.
    pub repository: Arc<InMemoryHierarchyRepository>,
}

impl Harness {
    /// Builds a harness enforcing `workflow`.
    #[must_use]
    pub fn with_workflow(workflow: WorkflowDefinition) -> Self {
        let repository = Arc::new(InMemoryHierarchyRepository::new());
        let service = TaskLifecycleService::new(
            Arc::clone(&repository),
            Arc::new(workflow),
            Arc::new(DefaultClock),
        );
        Self {
            service,
            repository,
        }
    }
}

/// Provides a harness over the built-in workflow.
#[fixture]
pub fn harness() -> Harness {
    Harness::with_workflow(WorkflowDefinition::builtin())
}

/// Parses a task key.
///
/// # Errors
///
/// Returns an error if the key is blank or contains whitespace.
pub fn task_key(value: &str) -> eyre::Result<TaskKey> {
    TaskKey::new(value).wrap_err_with(|| format!("parse task key {value}"))
}

/// Parses a feature key.
///
/// # Errors
///
/// Returns an error if the key is blank or contains whitespace.
pub fn feature_key(value: &str) -> eyre::Result<FeatureKey> {
    FeatureKey::new(value).wrap_err_with(|| format!("parse feature key {value}"))
}

/// Parses an epic key.
///
/// # Errors
///
/// Returns an error if the key is blank or contains whitespace.
pub fn epic_key(value: &str) -> eyre::Result<EpicKey> {
    EpicKey::new(value).wrap_err_with(|| format!("parse epic key {value}"))
}

/// Creates epic `epic` with the listed features.
///
/// # Errors
///
/// Returns an error if any creation fails.
pub async fn seed_epic(service: &TestService, epic: &str, features: &[&str]) -> eyre::Result<()> {
    let key = epic_key(epic)?;
    service
        .create_epic(key.clone(), epic)
        .await
        .wrap_err("create epic")?;
    for feature in features {
        service
            .create_feature(&key, feature_key(feature)?, feature, None)
            .await
            .wrap_err_with(|| format!("create feature {feature}"))?;
    }
    Ok(())
}

/// Creates a task in `feature` with the given prerequisites.
///
/// # Errors
///
/// Returns an error if creation fails.
pub async fn add_task(
    service: &TestService,
    feature: &str,
    task: &str,
    depends_on: &[&str],
) -> eyre::Result<Task> {
    let request = CreateTaskRequest::new(feature_key(feature)?, task_key(task)?, task)
        .with_dependencies(depends_on.iter().copied());
    service
        .create_task(request)
        .await
        .wrap_err_with(|| format!("create task {task}"))
}

/// Walks a task through the listed statuses without forcing.
///
/// # Errors
///
/// Returns an error if any move is rejected.
pub async fn walk(service: &TestService, task: &str, statuses: &[&str]) -> eyre::Result<Task> {
    let key = task_key(task)?;
    let mut current = None;
    for status in statuses {
        let change = service
            .change_status(&key, TransitionRequest::new(*status))
            .await
            .wrap_err_with(|| format!("move {task} to {status}"))?;
        current = Some(change.task);
    }
    current.ok_or_else(|| eyre::eyre!("no statuses supplied for {task}"))
}

/// Loads a task that must exist.
///
/// # Errors
///
/// Returns an error if the lookup fails or the task is missing.
pub async fn load(service: &TestService, task: &str) -> eyre::Result<Task> {
    service
        .find_task(&task_key(task)?)
        .await
        .wrap_err("find task")?
        .ok_or_else(|| eyre::eyre!("task {task} not found"))
}
