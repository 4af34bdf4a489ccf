//! Built-in workflow used when a project supplies none.
//!
//! ```text
//! todo -> in_progress -> ready_for_review -> completed -> archived
//!           ^    |              |
//!           |    v              v
//!           +-- blocked <-------+ (via in_progress)
//! ```

use super::{
    AWAITING_APPROVAL_STATUS_KEY, COMPLETE_STATUS_KEY, DEFAULT_WORKFLOW_VERSION, START_STATUS_KEY,
    StatusMetadata, WorkflowDocument,
};
use std::collections::BTreeMap;

/// Phase ordering applied when a document does not declare one.
pub const DEFAULT_PHASE_ORDER: [&str; 6] =
    ["planning", "development", "review", "qa", "approval", "done"];

fn status_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

fn metadata(color: &str, description: &str, phase: &str, roles: &[&str]) -> StatusMetadata {
    StatusMetadata {
        color: Some(color.to_owned()),
        description: Some(description.to_owned()),
        phase: Some(phase.to_owned()),
        actor_roles: status_list(roles),
        progress_weight: None,
        orchestrator_action: None,
    }
}

/// Returns the document describing the built-in workflow.
#[must_use]
pub fn default_document() -> WorkflowDocument {
    let status_flow = BTreeMap::from([
        ("todo".to_owned(), status_list(&["in_progress", "blocked"])),
        (
            "in_progress".to_owned(),
            status_list(&["ready_for_review", "blocked"]),
        ),
        (
            "ready_for_review".to_owned(),
            status_list(&["completed", "in_progress"]),
        ),
        ("completed".to_owned(), status_list(&["archived"])),
        ("archived".to_owned(), Vec::new()),
        ("blocked".to_owned(), status_list(&["todo", "in_progress"])),
    ]);

    let status_metadata = BTreeMap::from([
        (
            "todo".to_owned(),
            metadata(
                "gray",
                "Task is ready to be started",
                "planning",
                &["business-analyst", "project-manager", "developer"],
            ),
        ),
        (
            "in_progress".to_owned(),
            StatusMetadata {
                progress_weight: Some(0.5),
                ..metadata(
                    "blue",
                    "Task is actively being worked on",
                    "development",
                    &["developer", "backend", "frontend", "api-developer"],
                )
            },
        ),
        (
            "ready_for_review".to_owned(),
            StatusMetadata {
                progress_weight: Some(0.75),
                ..metadata(
                    "yellow",
                    "Implementation complete, awaiting code review",
                    "review",
                    &["tech-lead", "senior-developer"],
                )
            },
        ),
        (
            "completed".to_owned(),
            metadata("green", "Task reviewed, approved, and merged", "done", &[]),
        ),
        (
            "archived".to_owned(),
            metadata("gray", "Task retained for reference only", "done", &[]),
        ),
        (
            "blocked".to_owned(),
            metadata(
                "red",
                "Task blocked by external dependency or issue",
                "blocked",
                &["project-manager", "tech-lead"],
            ),
        ),
    ]);

    let special_statuses = BTreeMap::from([
        (START_STATUS_KEY.to_owned(), status_list(&["todo"])),
        (
            COMPLETE_STATUS_KEY.to_owned(),
            status_list(&["completed", "archived"]),
        ),
        (
            AWAITING_APPROVAL_STATUS_KEY.to_owned(),
            status_list(&["ready_for_review"]),
        ),
    ]);

    WorkflowDocument {
        version: Some(DEFAULT_WORKFLOW_VERSION.to_owned()),
        status_flow,
        status_metadata,
        special_statuses,
        phase_order: Some(status_list(&DEFAULT_PHASE_ORDER)),
        require_rejection_reason: Some(true),
    }
}
