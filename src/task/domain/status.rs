//! Task and container status types.

use super::ParseContainerStatusError;
use crate::workflow::domain::WorkflowDefinition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task status drawn from the active workflow.
///
/// Statuses are strings rather than an enumeration so that projects can load
/// their own workflows. Membership is checked whenever a status enters the
/// system through [`TaskStatus::known`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStatus(String);

impl TaskStatus {
    /// Returns the status when the workflow defines it.
    #[must_use]
    pub fn known(value: &str, workflow: &WorkflowDefinition) -> Option<Self> {
        let trimmed = value.trim();
        workflow
            .is_known_status(trimmed)
            .then(|| Self(trimmed.to_owned()))
    }

    /// Reconstructs a status read back from storage.
    ///
    /// Persisted statuses were validated when written; they are not checked
    /// again here so that rows survive workflow edits.
    #[must_use]
    pub const fn from_persisted(value: String) -> Self {
        Self(value)
    }

    /// Returns the status as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskStatus {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for TaskStatus {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TaskStatus {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status shared by features and epics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    /// No work has started.
    Draft,
    /// Work is underway.
    Active,
    /// Every child has completed.
    Completed,
    /// Retained for reference only.
    Archived,
}

impl ContainerStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Returns `true` for completed and archived containers.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Archived)
    }
}

impl TryFrom<&str> for ContainerStatus {
    type Error = ParseContainerStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseContainerStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
