//! Storage constraints reported through the port's error variants.

use super::helpers::{
    PgContext, at, count_rows, epic_key, feature_key, pg_context, seed, task_key, todo,
};
use atelier::task::{
    domain::{EpicId, FeatureId, NewEpic, NewFeature, NewTask, NewTaskHistory, TaskId},
    ports::HierarchyRepositoryError,
};
use eyre::ensure;
use rstest::rstest;

#[rstest]
fn reused_keys_are_duplicates(pg_context: eyre::Result<PgContext>) -> eyre::Result<()> {
    let ctx = pg_context?;
    let seeded = seed(&ctx)?;
    let epic = NewEpic::new(epic_key("E01")?, "Again", at())?;
    let task = NewTask::new(seeded.feature.id(), task_key("T1")?, "Again", todo(), at())?;

    let epic_result = ctx.run(move |tx| tx.insert_epic(epic));
    let task_result = ctx.run(move |tx| tx.insert_task(task));

    ensure!(matches!(
        epic_result,
        Err(HierarchyRepositoryError::DuplicateKey { entity: "epic", ref key }) if key == "E01"
    ));
    ensure!(matches!(
        task_result,
        Err(HierarchyRepositoryError::DuplicateKey { entity: "task", ref key }) if key == "T1"
    ));
    Ok(())
}

#[rstest]
fn missing_parents_are_reported_by_entity(
    pg_context: eyre::Result<PgContext>,
) -> eyre::Result<()> {
    let ctx = pg_context?;
    let feature = NewFeature::new(EpicId::new(404), feature_key("E09-F01")?, "Orphan", at())?;
    let task = NewTask::new(FeatureId::new(404), task_key("orphan")?, "Orphan", todo(), at())?;
    let history = NewTaskHistory::creation(TaskId::new(404), todo(), None, at());

    let feature_result = ctx.run(move |tx| tx.insert_feature(feature));
    let task_result = ctx.run(move |tx| tx.insert_task(task));
    let history_result = ctx.run(move |tx| tx.append_history(history));

    ensure!(matches!(
        feature_result,
        Err(HierarchyRepositoryError::NotFound { entity: "epic", .. })
    ));
    ensure!(matches!(
        task_result,
        Err(HierarchyRepositoryError::NotFound { entity: "feature", .. })
    ));
    ensure!(matches!(
        history_result,
        Err(HierarchyRepositoryError::NotFound { entity: "task", .. })
    ));
    Ok(())
}

#[rstest]
fn stale_revision_is_a_concurrent_modification(
    pg_context: eyre::Result<PgContext>,
) -> eyre::Result<()> {
    let ctx = pg_context?;
    let seeded = seed(&ctx)?;
    let first = seeded.task.clone();
    let second = seeded.task;

    ctx.run(move |tx| tx.update_task(&first))?;
    let result = ctx.run(move |tx| tx.update_task(&second));

    ensure!(matches!(
        result,
        Err(HierarchyRepositoryError::ConcurrentModification { entity: "task", ref key })
            if key == "T1"
    ));
    Ok(())
}

#[rstest]
fn updating_a_deleted_row_is_not_found(pg_context: eyre::Result<PgContext>) -> eyre::Result<()> {
    let ctx = pg_context?;
    let seeded = seed(&ctx)?;
    let feature = seeded.feature;
    let feature_id = feature.id();

    ctx.run(move |tx| tx.delete_feature(feature_id))?;
    let update = ctx.run(move |tx| tx.update_feature(&feature));
    let delete_again = ctx.run(move |tx| tx.delete_feature(feature_id));

    ensure!(matches!(
        update,
        Err(HierarchyRepositoryError::NotFound { entity: "feature", .. })
    ));
    ensure!(matches!(
        delete_again,
        Err(HierarchyRepositoryError::NotFound { entity: "feature", .. })
    ));
    Ok(())
}

#[rstest]
fn deleting_a_task_removes_its_history(pg_context: eyre::Result<PgContext>) -> eyre::Result<()> {
    let ctx = pg_context?;
    let seeded = seed(&ctx)?;
    let task_id = seeded.task.id();
    let mut conn = ctx.connect()?;
    ensure!(count_rows(&mut conn, "task_history")? == 1);

    ctx.run(move |tx| tx.delete_task(task_id))?;

    ensure!(count_rows(&mut conn, "tasks")? == 0);
    ensure!(count_rows(&mut conn, "task_history")? == 0);
    Ok(())
}

#[rstest]
fn deleting_an_epic_removes_everything_beneath_it(
    pg_context: eyre::Result<PgContext>,
) -> eyre::Result<()> {
    let ctx = pg_context?;
    let seeded = seed(&ctx)?;
    let epic_id = seeded.epic.id();

    ctx.run(move |tx| tx.delete_epic(epic_id))?;

    let mut conn = ctx.connect()?;
    for table in ["epics", "features", "tasks", "task_history"] {
        ensure!(count_rows(&mut conn, table)? == 0, "{table} should be empty");
    }
    Ok(())
}
