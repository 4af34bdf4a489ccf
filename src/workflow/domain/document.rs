//! Serialized workflow configuration document.
//!
//! The document mirrors the on-disk JSON layout:
//!
//! ```json
//! {
//!   "status_flow_version": "1.0",
//!   "status_flow": {
//!     "todo": ["in_progress", "blocked"],
//!     "in_progress": ["ready_for_review", "blocked"],
//!     "ready_for_review": ["completed", "in_progress"],
//!     "completed": [],
//!     "blocked": ["todo", "in_progress"]
//!   },
//!   "status_metadata": {
//!     "in_progress": { "phase": "development", "agent_types": ["developer"] }
//!   },
//!   "special_statuses": { "_start_": ["todo"], "_complete_": ["completed"] }
//! }
//! ```
//!
//! Unknown top-level keys are ignored so the workflow can live inside a larger
//! project configuration file.

use super::OrchestratorAction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Special status key listing the statuses new tasks start in.
pub const START_STATUS_KEY: &str = "_start_";

/// Special status key listing terminal statuses.
pub const COMPLETE_STATUS_KEY: &str = "_complete_";

/// Optional special status key naming the blocked status.
pub const BLOCKED_STATUS_KEY: &str = "_blocked_";

/// Optional special status key listing statuses that await approval.
pub const AWAITING_APPROVAL_STATUS_KEY: &str = "_awaiting_approval_";

/// Version written when a document does not declare one.
pub const DEFAULT_WORKFLOW_VERSION: &str = "1.0";

/// Per-status metadata.
///
/// Every field is optional in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusMetadata {
    /// Display colour, for example `"green"` or `"#FF5733"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Human-readable description of the status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Workflow phase the status belongs to, for example `"development"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Actor roles permitted to work on tasks in this status.
    #[serde(default, rename = "agent_types")]
    pub actor_roles: Vec<String>,
    /// Contribution of this status to weighted progress (`0.0..=1.0`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_weight: Option<f64>,
    /// Action an orchestrator should take when a task enters this status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestrator_action: Option<OrchestratorAction>,
}

/// Raw workflow configuration as read from storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    /// Schema version of the document.
    #[serde(default, rename = "status_flow_version")]
    pub version: Option<String>,
    /// Map from status to its legal next statuses.
    #[serde(default)]
    pub status_flow: BTreeMap<String, Vec<String>>,
    /// Map from status to its metadata.
    #[serde(default)]
    pub status_metadata: BTreeMap<String, StatusMetadata>,
    /// Named status sets such as `_start_` and `_complete_`.
    #[serde(default)]
    pub special_statuses: BTreeMap<String, Vec<String>>,
    /// Phase ordering used to classify backward transitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase_order: Option<Vec<String>>,
    /// Whether backward transitions require a justification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_rejection_reason: Option<bool>,
}

impl WorkflowDocument {
    /// Returns `true` when the document declares no status flow at all.
    ///
    /// Loaders treat such documents as absent and fall back to the built-in
    /// definition.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status_flow.is_empty()
    }

    /// Returns the named special status list, or an empty slice.
    #[must_use]
    pub fn special(&self, key: &str) -> &[String] {
        self.special_statuses.get(key).map_or(&[], Vec::as_slice)
    }
}
