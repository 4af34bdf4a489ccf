//! Service entry points for task status changes.

use super::{
    TaskLifecycleResult,
    support::{apply_transition, require_task},
};
use crate::task::{
    domain::{Task, TaskHistory, TaskKey, TransitionError},
    engine::{TransitionRequest, TransitionValidator},
    ports::{HierarchyRepository, HierarchyTransaction},
};
use crate::workflow::domain::{PopulatedAction, WorkflowDefinition};
use mockable::Clock;
use std::sync::Arc;

/// Outcome of a committed status change.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    /// Task after the change.
    pub task: Task,
    /// History row recording the change.
    pub history: TaskHistory,
    /// Dependents blocked because the change reopened the task.
    pub auto_blocked: Vec<Task>,
    /// Orchestrator action attached to the new status, if any.
    pub action: Option<PopulatedAction>,
}

/// Hierarchy orchestration service.
///
/// Each operation runs in one repository transaction: it reads a fresh
/// snapshot, applies the lifecycle engine and writes every affected row, or
/// fails without writing anything.
#[derive(Clone)]
pub struct TaskLifecycleService<R, C>
where
    R: HierarchyRepository,
    C: Clock + Send + Sync,
{
    pub(super) repository: Arc<R>,
    pub(super) workflow: Arc<WorkflowDefinition>,
    pub(super) clock: Arc<C>,
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: HierarchyRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new service over the repository and workflow.
    #[must_use]
    pub const fn new(repository: Arc<R>, workflow: Arc<WorkflowDefinition>, clock: Arc<C>) -> Self {
        Self {
            repository,
            workflow,
            clock,
        }
    }

    /// Returns the workflow the service enforces.
    #[must_use]
    pub fn workflow(&self) -> &WorkflowDefinition {
        &self.workflow
    }

    /// Moves a task to the requested status.
    ///
    /// Moving from a status awaiting approval back into active work also
    /// blocks every incomplete transitive dependent.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound) for an unknown task,
    /// [`TaskLifecycleError::Transition`](super::TaskLifecycleError::Transition) when the workflow rejects the move,
    /// or [`TaskLifecycleError::Repository`](super::TaskLifecycleError::Repository) when persistence fails.
    pub async fn change_status(
        &self,
        task_key: &TaskKey,
        request: TransitionRequest,
    ) -> TaskLifecycleResult<StatusChange> {
        let workflow = Arc::clone(&self.workflow);
        let key = task_key.clone();
        let now = self.clock.utc();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<StatusChange> {
                    let task = require_task(tx, &key)?;
                    let decision =
                        TransitionValidator::new(&workflow).validate(&key, task.status(), &request)?;
                    apply_transition(tx, &workflow, task, &decision, &request, now)
                },
            )
            .await
    }

    /// Sends a task awaiting approval back into active work.
    ///
    /// No justification is required; dependents are blocked as for
    /// [`Self::change_status`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Transition`](super::TaskLifecycleError::Transition) with
    /// [`TransitionError::NotAReopen`] when the move does not reopen the
    /// task, plus the errors of [`Self::change_status`].
    pub async fn reopen(
        &self,
        task_key: &TaskKey,
        request: TransitionRequest,
    ) -> TaskLifecycleResult<StatusChange> {
        let workflow = Arc::clone(&self.workflow);
        let key = task_key.clone();
        let now = self.clock.utc();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<StatusChange> {
                    let task = require_task(tx, &key)?;
                    let decision = TransitionValidator::new(&workflow)
                        .validate_reopen(&key, task.status(), &request)?;
                    apply_transition(tx, &workflow, task, &decision, &request, now)
                },
            )
            .await
    }

    /// Moves a task to the workflow's blocked status with a reason.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NoBlockedStatus`] when the workflow has no
    /// blocked status, plus the errors of [`Self::change_status`].
    pub async fn block_task(
        &self,
        task_key: &TaskKey,
        reason: &str,
        actor: Option<&str>,
    ) -> TaskLifecycleResult<StatusChange> {
        let workflow = Arc::clone(&self.workflow);
        let key = task_key.clone();
        let reason_text = reason.trim().to_owned();
        let agent = actor.map(str::to_owned);
        let now = self.clock.utc();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<StatusChange> {
                    let blocked = workflow
                        .blocked_status()
                        .ok_or_else(|| TransitionError::NoBlockedStatus { task: key.clone() })?;
                    let mut request = TransitionRequest::new(blocked).with_note(reason_text);
                    if let Some(name) = agent {
                        request = request.with_actor(name);
                    }

                    let task = require_task(tx, &key)?;
                    let decision =
                        TransitionValidator::new(&workflow).validate(&key, task.status(), &request)?;
                    apply_transition(tx, &workflow, task, &decision, &request, now)
                },
            )
            .await
    }

    /// Returns a blocked task to the workflow's initial status.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotBlocked`] when the task is not blocked,
    /// plus the errors of [`Self::change_status`].
    pub async fn unblock_task(
        &self,
        task_key: &TaskKey,
        actor: Option<&str>,
    ) -> TaskLifecycleResult<StatusChange> {
        let workflow = Arc::clone(&self.workflow);
        let key = task_key.clone();
        let agent = actor.map(str::to_owned);
        let now = self.clock.utc();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<StatusChange> {
                    let task = require_task(tx, &key)?;
                    if !workflow.is_blocked_status(task.status().as_str()) {
                        return Err(TransitionError::NotBlocked {
                            task: key,
                            status: task.status().to_string(),
                        }
                        .into());
                    }
                    let mut request =
                        TransitionRequest::new(workflow.initial_status().unwrap_or_default());
                    if let Some(name) = agent {
                        request = request.with_actor(name);
                    }
                    let decision =
                        TransitionValidator::new(&workflow).validate(&key, task.status(), &request)?;
                    apply_transition(tx, &workflow, task, &decision, &request, now)
                },
            )
            .await
    }

    /// Returns a task's status history, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound) for an unknown task or
    /// [`TaskLifecycleError::Repository`](super::TaskLifecycleError::Repository) when persistence fails.
    pub async fn task_history(&self, task_key: &TaskKey) -> TaskLifecycleResult<Vec<TaskHistory>> {
        let key = task_key.clone();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Vec<TaskHistory>> {
                    let task = require_task(tx, &key)?;
                    Ok(tx.history_for_task(task.id())?)
                },
            )
            .await
    }
}
