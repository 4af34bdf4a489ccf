//! Immutable workflow state machine.

use super::{
    AWAITING_APPROVAL_STATUS_KEY, BLOCKED_STATUS_KEY, COMPLETE_STATUS_KEY, DEFAULT_PHASE_ORDER,
    DEFAULT_WORKFLOW_VERSION, PopulatedAction, START_STATUS_KEY, StatusMetadata, WorkflowDocument,
    WorkflowError, default_document, validate_document,
};
use std::collections::BTreeMap;

/// Phase whose statuses count as active work.
pub const ACTIVE_PHASE: &str = "development";

/// Conventional name of the blocked status when `_blocked_` is not declared.
const CONVENTIONAL_BLOCKED_STATUS: &str = "blocked";

/// Loaded, validated workflow.
///
/// Definitions are read-only once built and are shared between services as
/// `Arc<WorkflowDefinition>`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowDefinition {
    version: String,
    transitions: BTreeMap<String, Vec<String>>,
    metadata: BTreeMap<String, StatusMetadata>,
    start: Vec<String>,
    complete: Vec<String>,
    blocked: Option<String>,
    awaiting_approval: Vec<String>,
    phase_order: Vec<String>,
    require_rejection_reason: bool,
}

impl Default for WorkflowDefinition {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WorkflowDefinition {
    /// Returns the built-in workflow.
    #[must_use]
    pub fn builtin() -> Self {
        Self::assemble(default_document())
    }

    /// Builds a definition from a parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the document fails structural
    /// validation.
    pub fn from_document(document: WorkflowDocument) -> Result<Self, WorkflowError> {
        validate_document(&document)?;
        Ok(Self::assemble(document))
    }

    fn assemble(document: WorkflowDocument) -> Self {
        let blocked = document
            .special(BLOCKED_STATUS_KEY)
            .first()
            .cloned()
            .or_else(|| {
                document
                    .status_flow
                    .contains_key(CONVENTIONAL_BLOCKED_STATUS)
                    .then(|| CONVENTIONAL_BLOCKED_STATUS.to_owned())
            });
        let phase_order = document.phase_order.clone().unwrap_or_else(|| {
            DEFAULT_PHASE_ORDER
                .iter()
                .map(|phase| (*phase).to_owned())
                .collect()
        });
        let start = document.special(START_STATUS_KEY).to_vec();
        let complete = document.special(COMPLETE_STATUS_KEY).to_vec();
        let declared_awaiting = document.special(AWAITING_APPROVAL_STATUS_KEY).to_vec();

        let mut definition = Self {
            version: document
                .version
                .unwrap_or_else(|| DEFAULT_WORKFLOW_VERSION.to_owned()),
            transitions: document.status_flow,
            metadata: document.status_metadata,
            start,
            complete,
            blocked,
            awaiting_approval: Vec::new(),
            phase_order,
            require_rejection_reason: document.require_rejection_reason.unwrap_or(true),
        };
        definition.awaiting_approval = if declared_awaiting.is_empty() {
            definition.derive_awaiting_approval()
        } else {
            declared_awaiting
        };
        definition
    }

    /// Statuses past active work that have not yet completed.
    fn derive_awaiting_approval(&self) -> Vec<String> {
        let Some(active_rank) = self.phase_rank(ACTIVE_PHASE) else {
            return Vec::new();
        };
        self.transitions
            .keys()
            .filter(|status| !self.is_complete_status(status))
            .filter(|status| {
                self.status_rank(status)
                    .is_some_and(|rank| rank > active_rank)
            })
            .cloned()
            .collect()
    }

    /// Converts the definition back into its document form.
    #[must_use]
    pub fn to_document(&self) -> WorkflowDocument {
        let mut special_statuses = BTreeMap::from([
            (START_STATUS_KEY.to_owned(), self.start.clone()),
            (COMPLETE_STATUS_KEY.to_owned(), self.complete.clone()),
            (
                AWAITING_APPROVAL_STATUS_KEY.to_owned(),
                self.awaiting_approval.clone(),
            ),
        ]);
        if let Some(blocked) = &self.blocked {
            special_statuses.insert(BLOCKED_STATUS_KEY.to_owned(), vec![blocked.clone()]);
        }
        WorkflowDocument {
            version: Some(self.version.clone()),
            status_flow: self.transitions.clone(),
            status_metadata: self.metadata.clone(),
            special_statuses,
            phase_order: Some(self.phase_order.clone()),
            require_rejection_reason: Some(self.require_rejection_reason),
        }
    }

    /// Returns the declared schema version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns every defined status in lexical order.
    #[must_use]
    pub fn statuses(&self) -> impl Iterator<Item = &str> {
        self.transitions.keys().map(String::as_str)
    }

    /// Returns `true` when the status is defined.
    #[must_use]
    pub fn is_known_status(&self, status: &str) -> bool {
        self.transitions.contains_key(status)
    }

    /// Returns the legal next statuses, or an empty slice for unknown or
    /// terminal statuses.
    #[must_use]
    pub fn allowed_next_statuses(&self, status: &str) -> &[String] {
        self.transitions.get(status).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` when `to` is listed as a legal next status of `from`.
    #[must_use]
    pub fn can_transition(&self, from: &str, to: &str) -> bool {
        self.allowed_next_statuses(from)
            .iter()
            .any(|candidate| candidate == to)
    }

    /// Returns metadata for the status, if any was configured.
    #[must_use]
    pub fn metadata(&self, status: &str) -> Option<&StatusMetadata> {
        self.metadata.get(status)
    }

    /// Returns the phase configured for the status.
    #[must_use]
    pub fn phase(&self, status: &str) -> Option<&str> {
        self.metadata(status)
            .and_then(|metadata| metadata.phase.as_deref())
    }

    /// Returns `true` when new tasks may begin in the status.
    #[must_use]
    pub fn is_start_status(&self, status: &str) -> bool {
        self.start.iter().any(|candidate| candidate == status)
    }

    /// Returns `true` when the status is terminal.
    #[must_use]
    pub fn is_complete_status(&self, status: &str) -> bool {
        self.complete.iter().any(|candidate| candidate == status)
    }

    /// Returns the configured start statuses.
    #[must_use]
    pub fn start_statuses(&self) -> &[String] {
        &self.start
    }

    /// Returns the configured terminal statuses.
    #[must_use]
    pub fn complete_statuses(&self) -> &[String] {
        &self.complete
    }

    /// Returns the status new tasks are created in.
    ///
    /// Validation guarantees at least one start status exists for documents
    /// loaded through [`Self::from_document`].
    #[must_use]
    pub fn initial_status(&self) -> Option<&str> {
        self.start.first().map(String::as_str)
    }

    /// Returns the status dependents are moved to when blocked.
    #[must_use]
    pub fn blocked_status(&self) -> Option<&str> {
        self.blocked.as_deref()
    }

    /// Returns `true` when the status is the blocked status.
    #[must_use]
    pub fn is_blocked_status(&self, status: &str) -> bool {
        self.blocked.as_deref() == Some(status)
    }

    /// Returns `true` when leaving the status for active work reopens a task.
    #[must_use]
    pub fn is_awaiting_approval(&self, status: &str) -> bool {
        self.awaiting_approval
            .iter()
            .any(|candidate| candidate == status)
    }

    /// Returns `true` when the status belongs to the active work phase.
    #[must_use]
    pub fn is_active_status(&self, status: &str) -> bool {
        self.phase(status) == Some(ACTIVE_PHASE)
    }

    /// Returns `true` when moving `from -> to` reopens finished work.
    #[must_use]
    pub fn is_reopen(&self, from: &str, to: &str) -> bool {
        self.is_awaiting_approval(from) && self.is_active_status(to)
    }

    /// Returns the 1-based position of a phase in the phase order.
    ///
    /// Phases absent from the order, such as `blocked` or `on_hold`, are
    /// unranked.
    #[must_use]
    pub fn phase_rank(&self, phase: &str) -> Option<usize> {
        self.phase_order
            .iter()
            .position(|candidate| candidate == phase)
            .map(|index| index + 1)
    }

    fn status_rank(&self, status: &str) -> Option<usize> {
        self.phase(status).and_then(|phase| self.phase_rank(phase))
    }

    /// Returns `true` when `to` lies in an earlier phase than `from`.
    ///
    /// Moves involving an unranked phase are never backward.
    #[must_use]
    pub fn is_backward(&self, from: &str, to: &str) -> bool {
        match (self.status_rank(from), self.status_rank(to)) {
            (Some(from_rank), Some(to_rank)) => to_rank < from_rank,
            _ => false,
        }
    }

    /// Returns whether backward moves must carry a justification.
    #[must_use]
    pub const fn requires_rejection_reason(&self) -> bool {
        self.require_rejection_reason
    }

    /// Returns the statuses whose metadata lists the actor role.
    #[must_use]
    pub fn statuses_for_actor(&self, role: &str) -> Vec<&str> {
        self.metadata
            .iter()
            .filter(|(_, metadata)| metadata.actor_roles.iter().any(|r| r == role))
            .map(|(status, _)| status.as_str())
            .collect()
    }

    /// Returns the statuses assigned to the phase.
    #[must_use]
    pub fn statuses_in_phase(&self, phase: &str) -> Vec<&str> {
        self.metadata
            .iter()
            .filter(|(_, metadata)| metadata.phase.as_deref() == Some(phase))
            .map(|(status, _)| status.as_str())
            .collect()
    }

    /// Returns the progress contribution of the status.
    ///
    /// Unconfigured statuses count fully when complete and not at all
    /// otherwise.
    #[must_use]
    pub fn progress_weight(&self, status: &str) -> f64 {
        self.metadata(status)
            .and_then(|metadata| metadata.progress_weight)
            .unwrap_or(if self.is_complete_status(status) {
                1.0
            } else {
                0.0
            })
    }

    /// Renders the orchestrator action configured for the status.
    ///
    /// Returns `Ok(None)` when the status has no action.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TemplateRender`] when the instruction
    /// template cannot be rendered.
    pub fn orchestrator_action(
        &self,
        status: &str,
        task_key: &str,
    ) -> Result<Option<PopulatedAction>, WorkflowError> {
        self.metadata(status)
            .and_then(|metadata| metadata.orchestrator_action.as_ref())
            .map(|action| action.populate(status, task_key))
            .transpose()
    }
}
