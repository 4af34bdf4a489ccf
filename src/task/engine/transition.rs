//! Status transition validation.

use crate::task::domain::{NewTaskHistory, TaskId, TaskKey, TaskStatus, TransitionError};
use crate::workflow::domain::WorkflowDefinition;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Requested status change.
///
/// `force` bypasses legality and justification checks; the bypass is logged
/// and recorded on the history row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    target: String,
    actor: Option<String>,
    note: Option<String>,
    force: bool,
}

impl TransitionRequest {
    /// Creates an unforced request for `target`.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            actor: None,
            note: None,
            force: false,
        }
    }

    /// Sets the requesting actor.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Sets the note, used as the justification for backward moves.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Sets whether workflow rules are bypassed.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Returns the requested status.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the requesting actor.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// Returns the note.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Returns whether workflow rules are bypassed.
    #[must_use]
    pub const fn force(&self) -> bool {
        self.force
    }

    fn has_justification(&self) -> bool {
        self.note.as_deref().is_some_and(|note| !note.trim().is_empty())
    }
}

/// Accepted transition, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionDecision {
    /// Status before the move.
    pub from: TaskStatus,
    /// Status after the move.
    pub to: TaskStatus,
    /// Whether the move goes to an earlier phase.
    pub backward: bool,
    /// Whether the request was forced.
    pub forced: bool,
    /// Whether forcing actually overrode a rule.
    pub bypassed: bool,
    /// Whether the move reopens work awaiting approval.
    pub reopens: bool,
}

impl TransitionDecision {
    /// Builds the history row recording this transition.
    #[must_use]
    pub fn history_entry(
        &self,
        task_id: TaskId,
        request: &TransitionRequest,
        at: DateTime<Utc>,
    ) -> NewTaskHistory {
        let notes = request.note().map(str::to_owned);
        let rejection_reason = if self.backward {
            notes.clone().filter(|note| !note.trim().is_empty())
        } else {
            None
        };
        NewTaskHistory {
            task_id,
            old_status: Some(self.from.clone()),
            new_status: self.to.clone(),
            agent: request.actor().map(str::to_owned),
            notes,
            rejection_reason,
            forced: self.forced,
            created_at: at,
        }
    }
}

/// Decides whether a status change is allowed by the workflow.
#[derive(Debug, Clone, Copy)]
pub struct TransitionValidator<'a> {
    workflow: &'a WorkflowDefinition,
}

impl<'a> TransitionValidator<'a> {
    /// Creates a validator for the workflow.
    #[must_use]
    pub const fn new(workflow: &'a WorkflowDefinition) -> Self {
        Self { workflow }
    }

    /// Validates a status change.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::UnknownStatus`] when the target is not
    /// defined, which forcing never bypasses. Unforced requests also fail
    /// with [`TransitionError::IllegalTransition`] when the workflow does not
    /// list the move, or [`TransitionError::ReasonRequired`] when a backward
    /// move carries no justification.
    pub fn validate(
        &self,
        task: &TaskKey,
        current: &TaskStatus,
        request: &TransitionRequest,
    ) -> Result<TransitionDecision, TransitionError> {
        self.check(task, current, request, true)
    }

    /// Validates a reopen: a move from a status awaiting approval back into
    /// active work.
    ///
    /// Reopening is itself the rejection, so no justification is required.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotAReopen`] when the move does not reopen
    /// the task, plus the errors of [`Self::validate`] other than
    /// [`TransitionError::ReasonRequired`].
    pub fn validate_reopen(
        &self,
        task: &TaskKey,
        current: &TaskStatus,
        request: &TransitionRequest,
    ) -> Result<TransitionDecision, TransitionError> {
        let decision = self.check(task, current, request, false)?;
        if !decision.reopens {
            return Err(TransitionError::NotAReopen {
                task: task.clone(),
                from: current.to_string(),
                to: decision.to.to_string(),
            });
        }
        Ok(decision)
    }

    fn check(
        &self,
        task: &TaskKey,
        current: &TaskStatus,
        request: &TransitionRequest,
        enforce_reason: bool,
    ) -> Result<TransitionDecision, TransitionError> {
        let target = TaskStatus::known(request.target(), self.workflow).ok_or_else(|| {
            TransitionError::UnknownStatus {
                task: task.clone(),
                status: request.target().to_owned(),
            }
        })?;

        let legal = self
            .workflow
            .can_transition(current.as_str(), target.as_str());
        if !legal && !request.force() {
            return Err(TransitionError::IllegalTransition {
                task: task.clone(),
                from: current.to_string(),
                to: target.to_string(),
                allowed: self
                    .workflow
                    .allowed_next_statuses(current.as_str())
                    .to_vec(),
            });
        }

        let backward = self.workflow.is_backward(current.as_str(), target.as_str());
        let reason_missing = enforce_reason
            && backward
            && self.workflow.requires_rejection_reason()
            && !request.has_justification();
        if reason_missing && !request.force() {
            return Err(TransitionError::ReasonRequired {
                task: task.clone(),
                from: current.to_string(),
                to: target.to_string(),
            });
        }

        let bypassed = request.force() && (!legal || reason_missing);
        if request.force() {
            warn!(
                task = %task,
                from = %current,
                to = %target,
                bypassed,
                actor = request.actor().unwrap_or("unknown"),
                "forced status transition"
            );
        } else {
            debug!(task = %task, from = %current, to = %target, backward, "status transition accepted");
        }

        Ok(TransitionDecision {
            reopens: self.workflow.is_reopen(current.as_str(), target.as_str()),
            from: current.clone(),
            to: target,
            backward,
            forced: request.force(),
            bypassed,
        })
    }
}
