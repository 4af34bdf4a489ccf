//! Epic aggregate.

use super::{ContainerStatus, EpicId, EpicKey, Revision, TaskDomainError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level grouping of features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epic {
    id: EpicId,
    key: EpicKey,
    title: String,
    status: ContainerStatus,
    progress_pct: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: Revision,
}

/// Insert payload for an epic that has not been assigned an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEpic {
    /// Unique epic key.
    pub key: EpicKey,
    /// Epic title.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewEpic {
    /// Creates an insert payload.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn new(
        key: EpicKey,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TaskDomainError> {
        let raw_title = title.into();
        let trimmed = raw_title.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        Ok(Self {
            key,
            title: trimmed.to_owned(),
            created_at,
        })
    }

    /// Materializes the epic once storage has assigned an identifier.
    #[must_use]
    pub fn into_epic(self, id: EpicId) -> Epic {
        Epic {
            id,
            key: self.key,
            title: self.title,
            status: ContainerStatus::Draft,
            progress_pct: 0.0,
            created_at: self.created_at,
            updated_at: self.created_at,
            revision: Revision::INITIAL,
        }
    }
}

/// Parameter object for reconstructing a persisted epic.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedEpicData {
    /// Persisted identifier.
    pub id: EpicId,
    /// Unique epic key.
    pub key: EpicKey,
    /// Epic title.
    pub title: String,
    /// Current status.
    pub status: ContainerStatus,
    /// Cached completion percentage.
    pub progress_pct: f64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Stored revision.
    pub revision: Revision,
}

impl Epic {
    /// Reconstructs an epic from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedEpicData) -> Self {
        Self {
            id: data.id,
            key: data.key,
            title: data.title,
            status: data.status,
            progress_pct: data.progress_pct,
            created_at: data.created_at,
            updated_at: data.updated_at,
            revision: data.revision,
        }
    }

    /// Returns the epic identifier.
    #[must_use]
    pub const fn id(&self) -> EpicId {
        self.id
    }

    /// Returns the epic key.
    #[must_use]
    pub const fn key(&self) -> &EpicKey {
        &self.key
    }

    /// Returns the epic title.
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

    /// Caches recomputed progress and, unless archived, the derived status.
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
        if self.status != ContainerStatus::Archived && self.status != derived {
            self.status = derived;
            changed = true;
        }
        if changed {
            self.updated_at = at;
        }
        changed
    }

    /// Returns a copy stamped with the revision written by storage.
    #[must_use]
    pub const fn with_revision(mut self, revision: Revision) -> Self {
        self.revision = revision;
        self
    }
}
