//! Feature aggregate.

use super::{
    ContainerStatus, EpicId, ExecutionOrder, FeatureId, FeatureKey, Revision, TaskDomainError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Group of tasks owned by one epic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    id: FeatureId,
    epic_id: EpicId,
    key: FeatureKey,
    title: String,
    status: ContainerStatus,
    progress_pct: f64,
    execution_order: Option<ExecutionOrder>,
    status_override: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: Revision,
}

/// Insert payload for a feature that has not been assigned an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeature {
    /// Owning epic.
    pub epic_id: EpicId,
    /// Unique feature key.
    pub key: FeatureKey,
    /// Feature title.
    pub title: String,
    /// Position among ordered siblings, if any.
    pub execution_order: Option<ExecutionOrder>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewFeature {
    /// Creates an unordered insert payload.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn new(
        epic_id: EpicId,
        key: FeatureKey,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TaskDomainError> {
        let raw_title = title.into();
        let trimmed = raw_title.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        Ok(Self {
            epic_id,
            key,
            title: trimmed.to_owned(),
            execution_order: None,
            created_at,
        })
    }

    /// Sets the requested sibling position.
    #[must_use]
    pub const fn with_execution_order(mut self, execution_order: ExecutionOrder) -> Self {
        self.execution_order = Some(execution_order);
        self
    }

    /// Materializes the feature once storage has assigned an identifier.
    #[must_use]
    pub fn into_feature(self, id: FeatureId) -> Feature {
        Feature {
            id,
            epic_id: self.epic_id,
            key: self.key,
            title: self.title,
            status: ContainerStatus::Draft,
            progress_pct: 0.0,
            execution_order: self.execution_order,
            status_override: false,
            created_at: self.created_at,
            updated_at: self.created_at,
            revision: Revision::INITIAL,
        }
    }
}

/// Parameter object for reconstructing a persisted feature.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedFeatureData {
    /// Persisted identifier.
    pub id: FeatureId,
    /// Owning epic.
    pub epic_id: EpicId,
    /// Unique feature key.
    pub key: FeatureKey,
    /// Feature title.
    pub title: String,
    /// Current status.
    pub status: ContainerStatus,
    /// Cached completion percentage.
    pub progress_pct: f64,
    /// Position among ordered siblings, if any.
    pub execution_order: Option<ExecutionOrder>,
    /// Whether automatic status assignment is suppressed.
    pub status_override: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Stored revision.
    pub revision: Revision,
}

impl Feature {
    /// Reconstructs a feature from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedFeatureData) -> Self {
        Self {
            id: data.id,
            epic_id: data.epic_id,
            key: data.key,
            title: data.title,
            status: data.status,
            progress_pct: data.progress_pct,
            execution_order: data.execution_order,
            status_override: data.status_override,
            created_at: data.created_at,
            updated_at: data.updated_at,
            revision: data.revision,
        }
    }

    /// Returns the feature identifier.
    #[must_use]
    pub const fn id(&self) -> FeatureId {
        self.id
    }

    /// Returns the owning epic.
    #[must_use]
    pub const fn epic_id(&self) -> EpicId {
        self.epic_id
    }

    /// Returns the feature key.
    #[must_use]
    pub const fn key(&self) -> &FeatureKey {
        &self.key
    }

    /// Returns the feature title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> ContainerStatus {
        self.status
    }

    /// Returns the cached completion percentage.
    #[must_use]
    pub const fn progress_pct(&self) -> f64 {
        self.progress_pct
    }

    /// Returns the position among ordered siblings.
    #[must_use]
    pub const fn execution_order(&self) -> Option<ExecutionOrder> {
        self.execution_order
    }

    /// Returns whether automatic status assignment is suppressed.
    #[must_use]
    pub const fn status_override(&self) -> bool {
        self.status_override
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

    /// Returns the stored revision.
    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    /// Caches recomputed progress and, unless overridden or archived, the
    /// derived status.
    ///
    /// Returns `true` when anything changed.
    pub fn record_progress(
        &mut self,
        progress_pct: f64,
        derived: ContainerStatus,
        at: DateTime<Utc>,
    ) -> bool {
        let mut changed = self.progress_pct.to_bits() != progress_pct.to_bits();
        self.progress_pct = progress_pct;

        let locked = self.status_override || self.status == ContainerStatus::Archived;
        if !locked && self.status != derived {
            self.status = derived;
            changed = true;
        }
        if changed {
            self.updated_at = at;
        }
        changed
    }

    /// Sets the status manually and records whether it should stick.
    pub const fn override_status(
        &mut self,
        status: ContainerStatus,
        status_override: bool,
        at: DateTime<Utc>,
    ) {
        self.status = status;
        self.status_override = status_override;
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
