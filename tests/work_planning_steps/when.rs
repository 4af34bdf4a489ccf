//! When steps for work planning BDD scenarios.

use super::world::{PlanningWorld, parse_task, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when(r#"task "{task}" is made to depend on "{prerequisite}""#)]
fn task_is_made_to_depend_on(
    world: &mut PlanningWorld,
    task: String,
    prerequisite: String,
) -> Result<(), eyre::Report> {
    let key = parse_task(&task)?;
    world.last_update = Some(run_async(
        world.service.update_dependencies(&key, vec![prerequisite]),
    ));
    Ok(())
}

#[when(r#"task "{task}" is moved to position {position:i64}"#)]
fn task_is_moved_to_position(
    world: &mut PlanningWorld,
    task: String,
    position: i64,
) -> Result<(), eyre::Report> {
    let key = parse_task(&task)?;
    run_async(world.service.reorder_task(&key, Some(position)))
        .wrap_err_with(|| format!("reorder {task}"))?;
    Ok(())
}
