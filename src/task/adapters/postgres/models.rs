//! Diesel row models for hierarchy persistence.

use super::schema::{epics, features, task_history, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for epics.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = epics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EpicRow {
    /// Storage-assigned identifier.
    pub id: i64,
    /// Unique epic key.
    pub key: String,
    /// Epic title.
    pub title: String,
    /// Container status.
    pub status: String,
    /// Cached completion percentage.
    pub progress_pct: f64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter.
    pub revision: i64,
}

/// Insert model for epics.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = epics)]
pub struct NewEpicRow {
    /// Unique epic key.
    pub key: String,
    /// Epic title.
    pub title: String,
    /// Container status.
    pub status: String,
    /// Cached completion percentage.
    pub progress_pct: f64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter.
    pub revision: i64,
}

/// Update model for epics.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = epics)]
pub struct EpicChanges {
    /// Epic title.
    pub title: String,
    /// Container status.
    pub status: String,
    /// Cached completion percentage.
    pub progress_pct: f64,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Revision written by this update.
    pub revision: i64,
}

/// Query result row for features.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = features)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FeatureRow {
    /// Storage-assigned identifier.
    pub id: i64,
    /// Owning epic.
    pub epic_id: i64,
    /// Unique feature key.
    pub key: String,
    /// Feature title.
    pub title: String,
    /// Container status.
    pub status: String,
    /// Cached completion percentage.
    pub progress_pct: f64,
    /// Position among ordered siblings.
    pub execution_order: Option<i32>,
    /// Whether automatic status assignment is suppressed.
    pub status_override: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter.
    pub revision: i64,
}

/// Insert model for features.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = features)]
pub struct NewFeatureRow {
    /// Owning epic.
    pub epic_id: i64,
    /// Unique feature key.
    pub key: String,
    /// Feature title.
    pub title: String,
    /// Container status.
    pub status: String,
    /// Cached completion percentage.
    pub progress_pct: f64,
    /// Position among ordered siblings.
    pub execution_order: Option<i32>,
    /// Whether automatic status assignment is suppressed.
    pub status_override: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter.
    pub revision: i64,
}

/// Update model for features.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = features)]
#[diesel(treat_none_as_null = true)]
pub struct FeatureChanges {
    /// Feature title.
    pub title: String,
    /// Container status.
    pub status: String,
    /// Cached completion percentage.
    pub progress_pct: f64,
    /// Position among ordered siblings.
    pub execution_order: Option<i32>,
    /// Whether automatic status assignment is suppressed.
    pub status_override: bool,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Revision written by this update.
    pub revision: i64,
}

/// Query result row for tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Storage-assigned identifier.
    pub id: i64,
    /// Owning feature.
    pub feature_id: i64,
    /// Unique task key.
    pub key: String,
    /// Task title.
    pub title: String,
    /// Workflow status.
    pub status: String,
    /// JSON array of prerequisite task keys.
    pub depends_on: String,
    /// Position among ordered siblings.
    pub execution_order: Option<i32>,
    /// Reason the task is blocked.
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
    /// Optimistic concurrency counter.
    pub revision: i64,
}

/// Insert model for tasks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Owning feature.
    pub feature_id: i64,
    /// Unique task key.
    pub key: String,
    /// Task title.
    pub title: String,
    /// Workflow status.
    pub status: String,
    /// JSON array of prerequisite task keys.
    pub depends_on: String,
    /// Position among ordered siblings.
    pub execution_order: Option<i32>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter.
    pub revision: i64,
}

/// Update model for tasks.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChanges {
    /// Task title.
    pub title: String,
    /// Workflow status.
    pub status: String,
    /// JSON array of prerequisite task keys.
    pub depends_on: String,
    /// Position among ordered siblings.
    pub execution_order: Option<i32>,
    /// Reason the task is blocked.
    pub blocked_reason: Option<String>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// First time the task entered active work.
    pub started_at: Option<DateTime<Utc>>,
    /// First time the task completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// First time the task was blocked.
    pub blocked_at: Option<DateTime<Utc>>,
    /// Revision written by this update.
    pub revision: i64,
}

/// Query result row for task history.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskHistoryRow {
    /// Storage-assigned identifier.
    pub id: i64,
    /// Task whose status changed.
    pub task_id: i64,
    /// Status before the change.
    pub old_status: Option<String>,
    /// Status after the change.
    pub new_status: String,
    /// Actor that requested the change.
    pub agent: Option<String>,
    /// Note supplied with the change.
    pub notes: Option<String>,
    /// Justification for backward moves.
    pub rejection_reason: Option<String>,
    /// Whether workflow rules were bypassed.
    pub forced: bool,
    /// When the change was committed.
    pub created_at: DateTime<Utc>,
}

/// Insert model for task history.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_history)]
pub struct NewTaskHistoryRow {
    /// Task whose status changed.
    pub task_id: i64,
    /// Status before the change.
    pub old_status: Option<String>,
    /// Status after the change.
    pub new_status: String,
    /// Actor that requested the change.
    pub agent: Option<String>,
    /// Note supplied with the change.
    pub notes: Option<String>,
    /// Justification for backward moves.
    pub rejection_reason: Option<String>,
    /// Whether workflow rules were bypassed.
    pub forced: bool,
    /// When the change was committed.
    pub created_at: DateTime<Utc>,
}
