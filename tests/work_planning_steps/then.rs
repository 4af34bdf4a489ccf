//! Then steps for work planning BDD scenarios.

use super::world::{PlanningWorld, parse_feature, run_async, split_list};
use atelier::task::{
    domain::{ContainerStatus, DependencyError, EpicKey, Task},
    services::TaskLifecycleError,
};
use rstest_bdd_macros::then;

fn last_update(
    world: &PlanningWorld,
) -> Result<&Result<Task, TaskLifecycleError>, eyre::Report> {
    world
        .last_update
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing dependency update result"))
}

#[then(r#"the update fails with a cycle through "{path}""#)]
fn update_fails_with_cycle(world: &PlanningWorld, path: String) -> Result<(), eyre::Report> {
    match last_update(world)? {
        Err(TaskLifecycleError::Dependency(DependencyError::CircularDependency {
            cycle, ..
        })) => {
            let actual: Vec<&str> = cycle.iter().map(|key| key.as_str()).collect();
            let expected: Vec<&str> = split_list(&path).collect();
            eyre::ensure!(actual == expected, "unexpected cycle path {actual:?}");
            Ok(())
        }
        other => Err(eyre::eyre!("expected a circular dependency, got {other:?}")),
    }
}

#[then(r#"the update fails because "{missing}" does not exist"#)]
fn update_fails_with_missing(world: &PlanningWorld, missing: String) -> Result<(), eyre::Report> {
    match last_update(world)? {
        Err(TaskLifecycleError::Dependency(DependencyError::DependencyNotFound {
            dependency,
            ..
        })) => {
            eyre::ensure!(
                dependency.as_str() == missing,
                "unexpected missing dependency {dependency}"
            );
            Ok(())
        }
        other => Err(eyre::eyre!("expected a missing dependency, got {other:?}")),
    }
}

#[then(r#"the positions in feature "{feature}" are "{positions}""#)]
fn positions_in_feature(
    world: &PlanningWorld,
    feature: String,
    positions: String,
) -> Result<(), eyre::Report> {
    let tasks = run_async(world.service.list_tasks(&parse_feature(&feature)?))?;
    let actual: Vec<String> = tasks
        .iter()
        .map(|task| {
            let position = task
                .execution_order()
                .map_or_else(|| "-".to_owned(), |order| i64::from(order).to_string());
            format!("{}={position}", task.key())
        })
        .collect();
    let expected: Vec<&str> = split_list(&positions).collect();
    eyre::ensure!(actual == expected, "unexpected positions {actual:?}");
    Ok(())
}

fn ensure_percent(actual: f64, expected: u32, subject: &str) -> Result<(), eyre::Report> {
    eyre::ensure!(
        actual.to_bits() == f64::from(expected).to_bits(),
        "expected {subject} at {expected}%, found {actual}"
    );
    Ok(())
}

#[then(r#"feature "{feature}" is {pct:u32} percent complete"#)]
fn feature_is_complete(
    world: &PlanningWorld,
    feature: String,
    pct: u32,
) -> Result<(), eyre::Report> {
    let progress = run_async(world.service.feature_progress(&parse_feature(&feature)?))?;
    ensure_percent(progress.progress_pct, pct, &feature)
}

#[then(r#"epic "{epic}" is {pct:u32} percent complete"#)]
fn epic_is_complete(world: &PlanningWorld, epic: String, pct: u32) -> Result<(), eyre::Report> {
    let progress = run_async(world.service.epic_progress(&EpicKey::new(epic.as_str())?))?;
    ensure_percent(progress.progress_pct, pct, &epic)
}

#[then(r#"epic "{epic}" counts {active:u32} active and {draft:u32} draft features"#)]
fn epic_counts_features(
    world: &PlanningWorld,
    epic: String,
    active: u32,
    draft: u32,
) -> Result<(), eyre::Report> {
    let progress = run_async(world.service.epic_progress(&EpicKey::new(epic.as_str())?))?;
    let count = |status: ContainerStatus| {
        progress
            .feature_status_counts
            .get(&status)
            .copied()
            .unwrap_or_default()
    };
    eyre::ensure!(count(ContainerStatus::Active) == active, "active count mismatch");
    eyre::ensure!(count(ContainerStatus::Draft) == draft, "draft count mismatch");
    Ok(())
}
