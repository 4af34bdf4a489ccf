//! Append-only task status history.

use super::{HistoryId, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recorded status change of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHistory {
    /// Storage-assigned identifier.
    pub id: HistoryId,
    /// Task whose status changed.
    pub task_id: TaskId,
    /// Status before the change; `None` for the creation entry.
    pub old_status: Option<TaskStatus>,
    /// Status after the change.
    pub new_status: TaskStatus,
    /// Actor that requested the change.
    pub agent: Option<String>,
    /// Free-form note supplied with the change.
    pub notes: Option<String>,
    /// Justification recorded for backward moves.
    pub rejection_reason: Option<String>,
    /// Whether workflow rules were bypassed.
    pub forced: bool,
    /// When the change was committed.
    pub created_at: DateTime<Utc>,
}

/// History row awaiting an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskHistory {
    /// Task whose status changed.
    pub task_id: TaskId,
    /// Status before the change; `None` for the creation entry.
    pub old_status: Option<TaskStatus>,
    /// Status after the change.
    pub new_status: TaskStatus,
    /// Actor that requested the change.
    pub agent: Option<String>,
    /// Free-form note supplied with the change.
    pub notes: Option<String>,
    /// Justification recorded for backward moves.
    pub rejection_reason: Option<String>,
    /// Whether workflow rules were bypassed.
    pub forced: bool,
    /// When the change was committed.
    pub created_at: DateTime<Utc>,
}

impl NewTaskHistory {
    /// Creates the entry recorded when a task is created.
    #[must_use]
    pub const fn creation(
        task_id: TaskId,
        status: TaskStatus,
        agent: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            old_status: None,
            new_status: status,
            agent,
            notes: None,
            rejection_reason: None,
            forced: false,
            created_at,
        }
    }

    /// Materializes the row once storage has assigned an identifier.
    #[must_use]
    pub fn into_history(self, id: HistoryId) -> TaskHistory {
        TaskHistory {
            id,
            task_id: self.task_id,
            old_status: self.old_status,
            new_status: self.new_status,
            agent: self.agent,
            notes: self.notes,
            rejection_reason: self.rejection_reason,
            forced: self.forced,
            created_at: self.created_at,
        }
    }
}
