//! When steps for task transition BDD scenarios.

use super::world::{TransitionWorld, parse_task, run_async};
use atelier::task::engine::TransitionRequest;
use rstest_bdd_macros::when;

fn record(
    world: &mut TransitionWorld,
    task: &str,
    request: TransitionRequest,
    reopen: bool,
) -> Result<(), eyre::Report> {
    let key = parse_task(task)?;
    let result = if reopen {
        run_async(world.service.reopen(&key, request))
    } else {
        run_async(world.service.change_status(&key, request))
    };
    world.last_task = Some(key);
    world.last_result = Some(result);
    Ok(())
}

#[when(r#"task "{task}" is reopened to "{status}""#)]
fn task_is_reopened(
    world: &mut TransitionWorld,
    task: String,
    status: String,
) -> Result<(), eyre::Report> {
    record(world, &task, TransitionRequest::new(status), true)
}

#[when(r#"task "{task}" is sent back to "{status}" with note "{note}""#)]
fn task_is_sent_back(
    world: &mut TransitionWorld,
    task: String,
    status: String,
    note: String,
) -> Result<(), eyre::Report> {
    record(world, &task, TransitionRequest::new(status).with_note(note), false)
}

#[when(r#"task "{task}" is moved straight to "{status}""#)]
fn task_is_moved(
    world: &mut TransitionWorld,
    task: String,
    status: String,
) -> Result<(), eyre::Report> {
    record(world, &task, TransitionRequest::new(status), false)
}

#[when(r#"task "{task}" is forced to "{status}""#)]
fn task_is_forced(
    world: &mut TransitionWorld,
    task: String,
    status: String,
) -> Result<(), eyre::Report> {
    let request = TransitionRequest::new(status)
        .with_force(true)
        .with_actor("operator");
    record(world, &task, request, false)
}
