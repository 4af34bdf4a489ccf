//! Services driven by a workflow read from the project directory.

use super::helpers::{Harness, add_task, load, seed_epic, task_key, walk};
use atelier::task::{
    domain::TransitionError, engine::TransitionRequest, services::TaskLifecycleError,
};
use atelier::workflow::{
    adapters::JsonFileWorkflowSource, domain::WorkflowDefinition, ports::WorkflowSource,
};
use camino::Utf8Path;
use eyre::{WrapErr, ensure};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const KANBAN_WORKFLOW: &str = r#"{
  "status_flow": {
    "backlog": ["doing", "parked"],
    "doing": ["review", "parked"],
    "review": ["shipped", "doing"],
    "parked": ["backlog", "doing"],
    "shipped": []
  },
  "status_metadata": {
    "backlog": { "phase": "planning" },
    "doing": { "phase": "development" },
    "review": {
      "phase": "review",
      "orchestrator_action": {
        "action": "spawn_agent",
        "agent_type": "reviewer",
        "skills": ["code-review"],
        "instruction_template": "Review {task_id}"
      }
    },
    "parked": { "phase": "blocked" },
    "shipped": { "phase": "done" }
  },
  "special_statuses": {
    "_start_": ["backlog"],
    "_complete_": ["shipped"],
    "_blocked_": ["parked"]
  }
}"#;

fn load_workflow(contents: Option<&str>) -> eyre::Result<WorkflowDefinition> {
    let temp = TempDir::new().wrap_err("create temporary project")?;
    let root = Utf8Path::from_path(temp.path())
        .ok_or_else(|| eyre::eyre!("temporary path is not UTF-8"))?;
    if let Some(document) = contents {
        std::fs::create_dir_all(temp.path().join(".atelier")).wrap_err("create config dir")?;
        std::fs::write(temp.path().join(".atelier/workflow.json"), document)
            .wrap_err("write workflow document")?;
    }
    let source = JsonFileWorkflowSource::open_ambient(root)?;
    Ok(source.load()?)
}

#[fixture]
fn kanban() -> Harness {
    let workflow = load_workflow(Some(KANBAN_WORKFLOW)).expect("kanban workflow should load");
    Harness::with_workflow(workflow)
}

#[rstest]
fn missing_document_falls_back_to_builtin() -> eyre::Result<()> {
    ensure!(load_workflow(None)? == WorkflowDefinition::builtin());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_start_in_the_configured_status(kanban: Harness) -> eyre::Result<()> {
    seed_epic(&kanban.service, "E01", &["E01-F01"]).await?;
    let created = add_task(&kanban.service, "E01-F01", "card", &[]).await?;
    ensure!(created.status() == &"backlog");

    let unknown = kanban
        .service
        .change_status(&task_key("card")?, TransitionRequest::new("in_progress"))
        .await;
    ensure!(matches!(
        unknown,
        Err(TaskLifecycleError::Transition(TransitionError::UnknownStatus { .. }))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn entering_review_returns_the_orchestrator_action(kanban: Harness) -> eyre::Result<()> {
    seed_epic(&kanban.service, "E01", &["E01-F01"]).await?;
    add_task(&kanban.service, "E01-F01", "card", &[]).await?;
    walk(&kanban.service, "card", &["doing"]).await?;

    let change = kanban
        .service
        .change_status(&task_key("card")?, TransitionRequest::new("review"))
        .await?;
    let action = change
        .action
        .ok_or_else(|| eyre::eyre!("review should carry an action"))?;
    ensure!(action.instruction == "Review card");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reopening_review_parks_dependents(kanban: Harness) -> eyre::Result<()> {
    seed_epic(&kanban.service, "E01", &["E01-F01"]).await?;
    add_task(&kanban.service, "E01-F01", "card", &[]).await?;
    add_task(&kanban.service, "E01-F01", "follow-up", &["card"]).await?;
    walk(&kanban.service, "card", &["doing", "review"]).await?;

    let change = kanban
        .service
        .reopen(&task_key("card")?, TransitionRequest::new("doing"))
        .await?;
    ensure!(change.auto_blocked.len() == 1);
    ensure!(load(&kanban.service, "follow-up").await?.status() == &"parked");
    Ok(())
}
