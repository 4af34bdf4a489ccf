//! Diesel schema for hierarchy persistence.

diesel::table! {
    /// Top-level epics.
    epics (id) {
        /// Storage-assigned identifier.
        id -> Int8,
        /// Unique epic key.
        #[max_length = 100]
        key -> Varchar,
        /// Epic title.
        title -> Text,
        /// Container status.
        #[max_length = 20]
        status -> Varchar,
        /// Cached completion percentage.
        progress_pct -> Float8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Optimistic concurrency counter.
        revision -> Int8,
    }
}

diesel::table! {
    /// Features owned by epics.
    features (id) {
        /// Storage-assigned identifier.
        id -> Int8,
        /// Owning epic.
        epic_id -> Int8,
        /// Unique feature key.
        #[max_length = 100]
        key -> Varchar,
        /// Feature title.
        title -> Text,
        /// Container status.
        #[max_length = 20]
        status -> Varchar,
        /// Cached completion percentage.
        progress_pct -> Float8,
        /// Position among the epic's ordered features.
        execution_order -> Nullable<Int4>,
        /// Whether automatic status assignment is suppressed.
        status_override -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Optimistic concurrency counter.
        revision -> Int8,
    }
}

diesel::table! {
    /// Tasks owned by features.
    tasks (id) {
        /// Storage-assigned identifier.
        id -> Int8,
        /// Owning feature.
        feature_id -> Int8,
        /// Unique task key.
        #[max_length = 100]
        key -> Varchar,
        /// Task title.
        title -> Text,
        /// Workflow status.
        #[max_length = 50]
        status -> Varchar,
        /// JSON array of prerequisite task keys.
        depends_on -> Text,
        /// Position among the feature's ordered tasks.
        execution_order -> Nullable<Int4>,
        /// Reason the task is blocked.
        blocked_reason -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// First time the task entered active work.
        started_at -> Nullable<Timestamptz>,
        /// First time the task completed.
        completed_at -> Nullable<Timestamptz>,
        /// First time the task was blocked.
        blocked_at -> Nullable<Timestamptz>,
        /// Optimistic concurrency counter.
        revision -> Int8,
    }
}

diesel::table! {
    /// Append-only task status history.
    task_history (id) {
        /// Storage-assigned identifier.
        id -> Int8,
        /// Task whose status changed.
        task_id -> Int8,
        /// Status before the change.
        #[max_length = 50]
        old_status -> Nullable<Varchar>,
        /// Status after the change.
        #[max_length = 50]
        new_status -> Varchar,
        /// Actor that requested the change.
        agent -> Nullable<Text>,
        /// Note supplied with the change.
        notes -> Nullable<Text>,
        /// Justification for backward moves.
        rejection_reason -> Nullable<Text>,
        /// Whether workflow rules were bypassed.
        forced -> Bool,
        /// When the change was committed.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(features -> epics (epic_id));
diesel::joinable!(tasks -> features (feature_id));
diesel::joinable!(task_history -> tasks (task_id));

diesel::allow_tables_to_appear_in_same_query!(epics, features, tasks, task_history);
