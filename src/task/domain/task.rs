//! Task aggregate and its persistence payloads.

use super::{
    DependencyList, ExecutionOrder, FeatureId, Revision, TaskDomainError, TaskId, TaskKey,
    TaskStatus,
};
use crate::workflow::domain::WorkflowDefinition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit of work owned by exactly one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    feature_id: FeatureId,
    key: TaskKey,
    title: String,
    status: TaskStatus,
    depends_on: DependencyList,
    execution_order: Option<ExecutionOrder>,
    blocked_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    blocked_at: Option<DateTime<Utc>>,
    revision: Revision,
}

/// Insert payload for a task that has not been assigned an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Owning feature.
    pub feature_id: FeatureId,
    /// Unique task key.
    pub key: TaskKey,
    /// Task title.
    pub title: String,
    /// Initial status.
    pub status: TaskStatus,
    /// Declared prerequisites.
    pub depends_on: DependencyList,
    /// Position among ordered siblings, if any.
    pub execution_order: Option<ExecutionOrder>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewTask {
    /// Creates an insert payload with no dependencies and no ordering.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn new(
        feature_id: FeatureId,
        key: TaskKey,
        title: impl Into<String>,
        status: TaskStatus,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TaskDomainError> {
        let raw_title = title.into();
        let trimmed = raw_title.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        Ok(Self {
            feature_id,
            key,
            title: trimmed.to_owned(),
            status,
            depends_on: DependencyList::new(),
            execution_order: None,
            created_at,
        })
    }

    /// Sets declared prerequisites.
    #[must_use]
    pub fn with_dependencies(mut self, depends_on: DependencyList) -> Self {
        self.depends_on = depends_on;
        self
    }

    /// Sets the requested sibling position.
    #[must_use]
    pub const fn with_execution_order(mut self, execution_order: ExecutionOrder) -> Self {
        self.execution_order = Some(execution_order);
        self
    }

    /// Materializes the task once storage has assigned an identifier.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            feature_id: self.feature_id,
            key: self.key,
            title: self.title,
            status: self.status,
            depends_on: self.depends_on,
            execution_order: self.execution_order,
            blocked_reason: None,
            created_at: self.created_at,
            updated_at: self.created_at,
            started_at: None,
            completed_at: None,
            blocked_at: None,
            revision: Revision::INITIAL,
        }
    }
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted identifier.
    pub id: TaskId,
    /// Owning feature.
    pub feature_id: FeatureId,
    /// Unique task key.
    pub key: TaskKey,
    /// Task title.
    pub title: String,
    /// Current status.
    pub status: TaskStatus,
    /// Declared prerequisites.
    pub depends_on: DependencyList,
    /// Position among ordered siblings, if any.
    pub execution_order: Option<ExecutionOrder>,
    /// Reason the task is blocked, if it is.
    pub blocked_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// First time the task entered active work.
    pub started_at: Option<DateTime<Utc>>,
    /// First time the task completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// First time the task was blocked.
    pub blocked_at: Option<DateTime<Utc>>,
    /// Stored revision.
    pub revision: Revision,
}

impl Task {
    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            feature_id: data.feature_id,
            key: data.key,
            title: data.title,
            status: data.status,
            depends_on: data.depends_on,
            execution_order: data.execution_order,
            blocked_reason: data.blocked_reason,
            created_at: data.created_at,
            updated_at: data.updated_at,
            started_at: data.started_at,
            completed_at: data.completed_at,
            blocked_at: data.blocked_at,
            revision: data.revision,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning feature.
    #[must_use]
    pub const fn feature_id(&self) -> FeatureId {
        self.feature_id
    }

    /// Returns the task key.
    #[must_use]
    pub const fn key(&self) -> &TaskKey {
        &self.key
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> &TaskStatus {
        &self.status
    }

    /// Returns the declared prerequisites.
    #[must_use]
    pub const fn depends_on(&self) -> &DependencyList {
        &self.depends_on
    }

    /// Returns the position among ordered siblings.
    #[must_use]
    pub const fn execution_order(&self) -> Option<ExecutionOrder> {
        self.execution_order
    }

    /// Returns why the task is blocked.
    #[must_use]
    pub fn blocked_reason(&self) -> Option<&str> {
        self.blocked_reason.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns when the task first entered active work.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the task first completed.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns when the task was first blocked.
    #[must_use]
    pub const fn blocked_at(&self) -> Option<DateTime<Utc>> {
        self.blocked_at
    }

    /// Returns the stored revision.
    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    /// Returns `true` when the status is terminal in the workflow.
    #[must_use]
    pub fn is_terminal(&self, workflow: &WorkflowDefinition) -> bool {
        workflow.is_complete_status(self.status.as_str())
    }

    /// Moves the task to `status`, stamping first-time lifecycle timestamps.
    ///
    /// Entering active work sets `started_at`, entering a complete status sets
    /// `completed_at` and entering the blocked status sets `blocked_at`; each
    /// is written only once. Leaving the blocked status clears the blocked
    /// reason.
    pub fn enter_status(
        &mut self,
        status: TaskStatus,
        workflow: &WorkflowDefinition,
        at: DateTime<Utc>,
    ) {
        let target = status.as_str();
        if workflow.is_active_status(target) && self.started_at.is_none() {
            self.started_at = Some(at);
        }
        if workflow.is_complete_status(target) && self.completed_at.is_none() {
            self.completed_at = Some(at);
        }
        if workflow.is_blocked_status(target) {
            if self.blocked_at.is_none() {
                self.blocked_at = Some(at);
            }
        } else {
            self.blocked_reason = None;
        }
        self.status = status;
        self.updated_at = at;
    }

    /// Moves the task to the blocked status with a reason.
    pub fn block(
        &mut self,
        blocked_status: TaskStatus,
        reason: impl Into<String>,
        workflow: &WorkflowDefinition,
        at: DateTime<Utc>,
    ) {
        self.enter_status(blocked_status, workflow, at);
        self.blocked_reason = Some(reason.into());
    }

    /// Replaces the declared prerequisites.
    pub fn replace_dependencies(&mut self, depends_on: DependencyList, at: DateTime<Utc>) {
        self.depends_on = depends_on;
        self.updated_at = at;
    }

    /// Sets or clears the sibling position.
    pub const fn set_execution_order(
        &mut self,
        execution_order: Option<ExecutionOrder>,
        at: DateTime<Utc>,
    ) {
        self.execution_order = execution_order;
        self.updated_at = at;
    }

    /// Returns a copy stamped with the revision written by storage.
    #[must_use]
    pub const fn with_revision(mut self, revision: Revision) -> Self {
        self.revision = revision;
        self
    }
}
