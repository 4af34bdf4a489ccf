//! Rejected operations leave no partial state behind.

use super::helpers::{Harness, add_task, feature_key, harness, load, seed_epic, task_key, walk};
use atelier::task::{
    domain::{DependencyError, Task, TransitionError},
    engine::TransitionRequest,
    services::{CreateTaskRequest, TaskLifecycleError},
};
use eyre::ensure;
use rstest::rstest;

struct Snapshot {
    tasks: Vec<Task>,
    history_rows: usize,
}

async fn snapshot(harness: &Harness) -> eyre::Result<Snapshot> {
    let tasks = harness.service.list_tasks(&feature_key("E01-F01")?).await?;
    Ok(Snapshot {
        tasks,
        history_rows: harness.repository.history_count(),
    })
}

async fn ensure_unchanged(harness: &Harness, before: &Snapshot) -> eyre::Result<()> {
    let after = snapshot(harness).await?;
    ensure!(after.tasks == before.tasks, "task rows changed");
    ensure!(after.history_rows == before.history_rows, "history rows changed");
    Ok(())
}

async fn seeded(harness: &Harness) -> eyre::Result<()> {
    seed_epic(&harness.service, "E01", &["E01-F01"]).await?;
    add_task(&harness.service, "E01-F01", "a", &[]).await?;
    add_task(&harness.service, "E01-F01", "b", &["a"]).await?;
    add_task(&harness.service, "E01-F01", "c", &["b"]).await?;
    walk(&harness.service, "a", &["in_progress", "ready_for_review"]).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reason_required_blocks_the_cascade(harness: Harness) -> eyre::Result<()> {
    seeded(&harness).await?;
    let before = snapshot(&harness).await?;

    let result = harness
        .service
        .change_status(&task_key("a")?, TransitionRequest::new("in_progress"))
        .await;

    ensure!(matches!(
        result,
        Err(TaskLifecycleError::Transition(TransitionError::ReasonRequired { .. }))
    ));
    ensure_unchanged(&harness, &before).await?;
    ensure!(load(&harness.service, "c").await?.status() == &"todo");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cyclic_dependency_update_writes_nothing(harness: Harness) -> eyre::Result<()> {
    seeded(&harness).await?;
    let before = snapshot(&harness).await?;

    let result = harness
        .service
        .update_dependencies_json(&task_key("a")?, r#"["c"]"#)
        .await;

    match result {
        Err(TaskLifecycleError::Dependency(DependencyError::CircularDependency { cycle, .. })) => {
            let path: Vec<&str> = cycle.iter().map(|key| key.as_str()).collect();
            ensure!(path == ["a", "c", "b", "a"]);
        }
        other => eyre::bail!("expected a circular dependency, got {other:?}"),
    }
    ensure_unchanged(&harness, &before).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_create_keeps_sibling_order(harness: Harness) -> eyre::Result<()> {
    seeded(&harness).await?;
    harness.service.reorder_task(&task_key("a")?, Some(1)).await?;
    harness.service.reorder_task(&task_key("b")?, Some(2)).await?;
    let before = snapshot(&harness).await?;

    let request = CreateTaskRequest::new(feature_key("E01-F01")?, task_key("d")?, "Late")
        .with_dependencies(["a", "missing"])
        .with_execution_order(1);
    let result = harness.service.create_task(request).await;

    ensure!(matches!(
        result,
        Err(TaskLifecycleError::Dependency(DependencyError::DependencyNotFound { .. }))
    ));
    ensure_unchanged(&harness, &before).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_entities_are_reported_by_key(harness: Harness) -> eyre::Result<()> {
    seeded(&harness).await?;

    let missing_task = harness.service.reorder_task(&task_key("ghost")?, Some(1)).await;
    match missing_task {
        Err(TaskLifecycleError::EntityNotFound { entity, key }) => {
            ensure!(entity == "task");
            ensure!(key == "ghost");
        }
        other => eyre::bail!("expected a missing task, got {other:?}"),
    }

    let missing_feature = harness
        .service
        .feature_progress(&feature_key("E01-F99")?)
        .await;
    ensure!(matches!(
        missing_feature,
        Err(TaskLifecycleError::EntityNotFound { entity: "feature", .. })
    ));
    Ok(())
}
