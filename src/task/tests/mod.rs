//! Unit tests for the work hierarchy.


use crate::task::domain::{
    DependencyList, FeatureId, NewTask, Task, TaskId, TaskKey, TaskStatus,
};
use chrono::{DateTime, Utc};

fn at() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
}

fn key(value: &str) -> TaskKey {
    TaskKey::new(value).expect("valid task key")
}

/// Builds a stored task without going through a repository.
fn task_in(feature: i64, id: i64, task_key: &str, status: &str, depends_on: &[&str]) -> Task {
    let dependencies = DependencyList::from_raw(task_key, depends_on.iter().copied())
        .expect("valid dependency list");
    NewTask::new(
        FeatureId::new(feature),
        key(task_key),
        format!("Task {task_key}"),
        TaskStatus::from_persisted(status.to_owned()),
        at(),
    )
    .expect("valid task")
    .with_dependencies(dependencies)
    .into_task(TaskId::new(id))
}

/// Compares percentages exactly; every expected value here is representable.
fn pct_eq(actual: f64, expected: f64) -> bool {
    actual.to_bits() == expected.to_bits()
}
