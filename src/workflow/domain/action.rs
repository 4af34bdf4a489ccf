//! Orchestrator actions attached to workflow statuses.

use super::WorkflowError;
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};

/// Action kinds an orchestrator understands.
pub const VALID_ACTION_KINDS: [&str; 4] = ["spawn_agent", "pause", "wait_for_triage", "archive"];

const SPAWN_AGENT: &str = "spawn_agent";
const LEGACY_TASK_PLACEHOLDER: &str = "{task_id}";
const TASK_PLACEHOLDER: &str = "{{ task_id }}";

/// Downstream action template for a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorAction {
    /// Action kind, one of [`VALID_ACTION_KINDS`].
    pub action: String,
    /// Agent type to spawn; required for `spawn_agent`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    /// Skills the spawned agent needs; required for `spawn_agent`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    /// Instruction text with a `{task_id}` or `{{ task_id }}` placeholder.
    pub instruction_template: String,
}

/// Orchestrator action with its instruction rendered for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulatedAction {
    /// Action kind.
    pub action: String,
    /// Agent type to spawn, if any.
    pub agent_type: Option<String>,
    /// Skills the spawned agent needs.
    pub skills: Vec<String>,
    /// Rendered instruction.
    pub instruction: String,
}

impl OrchestratorAction {
    /// Checks the action against the orchestrator contract.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidOrchestratorAction`] naming the
    /// offending field.
    pub fn validate(&self, status: &str) -> Result<(), WorkflowError> {
        let invalid = |field: &str, problem: String| WorkflowError::InvalidOrchestratorAction {
            status: status.to_owned(),
            field: field.to_owned(),
            problem,
        };

        if !VALID_ACTION_KINDS.contains(&self.action.as_str()) {
            return Err(invalid(
                "action",
                format!(
                    "unknown action type '{}', expected one of {}",
                    self.action,
                    VALID_ACTION_KINDS.join(", ")
                ),
            ));
        }
        if self.instruction_template.trim().is_empty() {
            return Err(invalid(
                "instruction_template",
                "missing required field".to_owned(),
            ));
        }
        if self.action != SPAWN_AGENT {
            return Ok(());
        }

        let has_agent_type = self
            .agent_type
            .as_deref()
            .is_some_and(|agent_type| !agent_type.trim().is_empty());
        if !has_agent_type {
            return Err(invalid(
                "agent_type",
                "required for spawn_agent actions".to_owned(),
            ));
        }
        if self.skills.is_empty() {
            return Err(invalid(
                "skills",
                "must list at least one skill for spawn_agent actions".to_owned(),
            ));
        }
        if let Some(index) = self.skills.iter().position(|skill| skill.trim().is_empty()) {
            return Err(invalid(
                &format!("skills[{index}]"),
                "skill names must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Renders the instruction template for the given task key.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TemplateRender`] when the template is not
    /// valid `minijinja` syntax.
    pub fn populate(&self, status: &str, task_key: &str) -> Result<PopulatedAction, WorkflowError> {
        let environment = Environment::new();
        let template = normalise_placeholders(&self.instruction_template);
        let instruction = environment
            .render_str(&template, context! { task_id => task_key })
            .map_err(|error| WorkflowError::TemplateRender {
                status: status.to_owned(),
                reason: error.to_string(),
            })?;

        Ok(PopulatedAction {
            action: self.action.clone(),
            agent_type: self.agent_type.clone(),
            skills: self.skills.clone(),
            instruction,
        })
    }
}

/// Rewrites single-brace `{task_id}` placeholders into template syntax.
///
/// Templates that already use `{{ ... }}` expressions are left alone.
fn normalise_placeholders(template: &str) -> String {
    if template.contains("{{") {
        return template.to_owned();
    }
    template.replace(LEGACY_TASK_PLACEHOLDER, TASK_PLACEHOLDER)
}
