//! Then steps for task transition BDD scenarios.

use super::world::{TransitionWorld, parse_task, run_async};
use atelier::task::{
    domain::TransitionError,
    engine::block_reason,
    services::{StatusChange, TaskLifecycleError},
};
use rstest_bdd_macros::then;

fn last_result(
    world: &TransitionWorld,
) -> Result<&Result<StatusChange, TaskLifecycleError>, eyre::Report> {
    world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transition result"))
}

#[then("the transition succeeds")]
fn transition_succeeds(world: &TransitionWorld) -> Result<(), eyre::Report> {
    match last_result(world)? {
        Ok(_) => Ok(()),
        Err(err) => Err(eyre::eyre!("expected the transition to succeed, got {err}")),
    }
}

#[then("the transition fails because a reason is required")]
fn transition_needs_reason(world: &TransitionWorld) -> Result<(), eyre::Report> {
    let result = last_result(world)?;
    if !matches!(
        result,
        Err(TaskLifecycleError::Transition(TransitionError::ReasonRequired { .. }))
    ) {
        return Err(eyre::eyre!("expected ReasonRequired, got {result:?}"));
    }
    Ok(())
}

#[then("the transition fails as illegal")]
fn transition_is_illegal(world: &TransitionWorld) -> Result<(), eyre::Report> {
    let result = last_result(world)?;
    if !matches!(
        result,
        Err(TaskLifecycleError::Transition(TransitionError::IllegalTransition { .. }))
    ) {
        return Err(eyre::eyre!("expected IllegalTransition, got {result:?}"));
    }
    Ok(())
}

#[then("the last history entry is flagged as forced")]
fn last_history_is_forced(world: &TransitionWorld) -> Result<(), eyre::Report> {
    let key = world
        .last_task
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transitioned task"))?;
    let history = run_async(world.service.task_history(key))?;
    let last = history
        .last()
        .ok_or_else(|| eyre::eyre!("task {key} has no history"))?;
    eyre::ensure!(last.forced, "expected the last history entry to be forced");
    Ok(())
}

fn stored_task(
    world: &TransitionWorld,
    task: &str,
) -> Result<atelier::task::domain::Task, eyre::Report> {
    run_async(world.service.find_task(&parse_task(task)?))?
        .ok_or_else(|| eyre::eyre!("task {task} not found"))
}

#[then(r#"task "{task}" has status "{status}""#)]
fn task_has_status(
    world: &TransitionWorld,
    task: String,
    status: String,
) -> Result<(), eyre::Report> {
    let stored = stored_task(world, &task)?;
    eyre::ensure!(
        stored.status().as_str() == status,
        "expected {task} in {status}, found {}",
        stored.status()
    );
    Ok(())
}

#[then(r#"task "{task}" is blocked because "{prerequisite}" was reopened"#)]
fn task_is_blocked_by(
    world: &TransitionWorld,
    task: String,
    prerequisite: String,
) -> Result<(), eyre::Report> {
    let stored = stored_task(world, &task)?;
    let expected = block_reason(&parse_task(&prerequisite)?);
    eyre::ensure!(
        stored.status().as_str() == "blocked",
        "expected {task} to be blocked, found {}",
        stored.status()
    );
    eyre::ensure!(
        stored.blocked_reason() == Some(expected.as_str()),
        "unexpected blocked reason {:?}",
        stored.blocked_reason()
    );
    Ok(())
}
