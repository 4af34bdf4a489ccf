//! Given steps for task transition BDD scenarios.

use super::world::{TransitionWorld, parse_task, run_async};
use atelier::task::{
    domain::{EpicKey, FeatureKey},
    engine::TransitionRequest,
    services::CreateTaskRequest,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"an epic "{epic}" with feature "{feature}""#)]
fn epic_with_feature(
    world: &mut TransitionWorld,
    epic: String,
    feature: String,
) -> Result<(), eyre::Report> {
    let epic_key = EpicKey::new(epic.as_str())?;
    run_async(world.service.create_epic(epic_key.clone(), &epic)).wrap_err("create epic")?;
    run_async(
        world
            .service
            .create_feature(&epic_key, FeatureKey::new(feature.as_str())?, &feature, None),
    )
    .wrap_err("create feature")?;
    Ok(())
}

fn create_task(
    world: &mut TransitionWorld,
    task: &str,
    feature: &str,
    depends_on: &[String],
) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new(FeatureKey::new(feature)?, parse_task(task)?, task)
        .with_dependencies(depends_on.iter().cloned());
    run_async(world.service.create_task(request))
        .wrap_err_with(|| format!("create task {task} for transition scenario"))?;
    Ok(())
}

#[given(r#"a task "{task}" in feature "{feature}""#)]
fn task_in_feature(
    world: &mut TransitionWorld,
    task: String,
    feature: String,
) -> Result<(), eyre::Report> {
    create_task(world, &task, &feature, &[])
}

#[given(r#"a dependent task "{task}" in feature "{feature}" needing "{prerequisite}""#)]
fn dependent_task_in_feature(
    world: &mut TransitionWorld,
    task: String,
    feature: String,
    prerequisite: String,
) -> Result<(), eyre::Report> {
    create_task(world, &task, &feature, &[prerequisite])
}

#[given(r#"task "{task}" has moved through "{statuses}""#)]
fn task_has_moved_through(
    world: &mut TransitionWorld,
    task: String,
    statuses: String,
) -> Result<(), eyre::Report> {
    let key = parse_task(&task)?;
    for status in statuses.split(',').map(str::trim) {
        run_async(
            world
                .service
                .change_status(&key, TransitionRequest::new(status)),
        )
        .wrap_err_with(|| format!("move {task} to {status} in scenario setup"))?;
    }
    Ok(())
}
