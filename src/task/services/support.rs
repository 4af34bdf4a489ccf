//! Transaction-scoped helpers shared by the service operations.

use super::{StatusChange, TaskLifecycleError, TaskLifecycleResult};
use crate::task::{
    domain::{
        Epic, EpicId, EpicKey, ExecutionOrder, Feature, FeatureId, FeatureKey, NewTaskHistory,
        Task, TaskId, TaskKey, TaskStatus,
    },
    engine::{
        AutoBlockPropagator, EpicProgress, FeatureProgress, ProgressAggregator, SequenceItem,
        TransitionDecision, TransitionRequest, resequence,
    },
    ports::HierarchyTransaction,
};
use crate::workflow::domain::WorkflowDefinition;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, info};

pub(super) fn require_task(
    tx: &mut dyn HierarchyTransaction,
    key: &TaskKey,
) -> TaskLifecycleResult<Task> {
    tx.task_by_key(key)?
        .ok_or_else(|| TaskLifecycleError::not_found("task", key))
}

pub(super) fn require_feature(
    tx: &mut dyn HierarchyTransaction,
    key: &FeatureKey,
) -> TaskLifecycleResult<Feature> {
    tx.feature_by_key(key)?
        .ok_or_else(|| TaskLifecycleError::not_found("feature", key))
}

pub(super) fn require_epic(
    tx: &mut dyn HierarchyTransaction,
    key: &EpicKey,
) -> TaskLifecycleResult<Epic> {
    tx.epic_by_key(key)?
        .ok_or_else(|| TaskLifecycleError::not_found("epic", key))
}

/// Commits an accepted transition with its history row, blocks dependents
/// when the move reopens the task and refreshes the affected roll-ups.
///
/// Entering the blocked status with a note records the note as the blocked
/// reason.
pub(super) fn apply_transition(
    tx: &mut dyn HierarchyTransaction,
    workflow: &WorkflowDefinition,
    task: Task,
    decision: &TransitionDecision,
    request: &TransitionRequest,
    now: DateTime<Utc>,
) -> TaskLifecycleResult<StatusChange> {
    let mut updated = task;
    let reason = request.note().map(str::trim).filter(|note| !note.is_empty());
    match reason {
        Some(text) if workflow.is_blocked_status(decision.to.as_str()) => {
            updated.block(decision.to.clone(), text, workflow, now);
        }
        _ => updated.enter_status(decision.to.clone(), workflow, now),
    }
    let stored = tx.update_task(&updated)?;
    let history = tx.append_history(decision.history_entry(stored.id(), request, now))?;
    info!(
        task = %stored.key(),
        from = %decision.from,
        to = %decision.to,
        forced = decision.forced,
        "task status changed"
    );

    let auto_blocked = if decision.reopens {
        block_dependents(tx, workflow, stored.key(), request.actor(), now)?
    } else {
        Vec::new()
    };

    let mut affected: BTreeSet<FeatureId> = BTreeSet::from([stored.feature_id()]);
    affected.extend(auto_blocked.iter().map(Task::feature_id));
    refresh_rollups(tx, workflow, &affected, now)?;

    let action = workflow.orchestrator_action(stored.status().as_str(), stored.key().as_str())?;
    Ok(StatusChange {
        task: stored,
        history,
        auto_blocked,
        action,
    })
}

/// Forces every eligible dependent of `reopened` into the blocked status.
pub(super) fn block_dependents(
    tx: &mut dyn HierarchyTransaction,
    workflow: &WorkflowDefinition,
    reopened: &TaskKey,
    actor: Option<&str>,
    now: DateTime<Utc>,
) -> TaskLifecycleResult<Vec<Task>> {
    let Some(blocked) = workflow
        .blocked_status()
        .and_then(|status| TaskStatus::known(status, workflow))
    else {
        return Ok(Vec::new());
    };

    let population = tx.all_tasks()?;
    let directives = AutoBlockPropagator::new(workflow).propagate(reopened, &population);
    let mut blocked_tasks = Vec::with_capacity(directives.len());

    for directive in directives {
        let Some(mut task) = population
            .iter()
            .find(|candidate| candidate.id() == directive.task_id)
            .cloned()
        else {
            continue;
        };
        let previous = task.status().clone();
        task.block(blocked.clone(), directive.reason.clone(), workflow, now);
        let stored = tx.update_task(&task)?;
        tx.append_history(NewTaskHistory {
            task_id: stored.id(),
            old_status: Some(previous),
            new_status: blocked.clone(),
            agent: actor.map(str::to_owned),
            notes: Some(directive.reason),
            rejection_reason: None,
            forced: true,
            created_at: now,
        })?;
        blocked_tasks.push(stored);
    }

    if !blocked_tasks.is_empty() {
        let keys: Vec<&str> = blocked_tasks.iter().map(|task| task.key().as_str()).collect();
        info!(task = %reopened, blocked = ?keys, "blocked dependents of reopened task");
    }
    Ok(blocked_tasks)
}

/// Recomputes and caches progress for the features and their epics.
pub(super) fn refresh_rollups(
    tx: &mut dyn HierarchyTransaction,
    workflow: &WorkflowDefinition,
    feature_ids: &BTreeSet<FeatureId>,
    now: DateTime<Utc>,
) -> TaskLifecycleResult<()> {
    let mut epic_ids: BTreeSet<EpicId> = BTreeSet::new();
    for feature_id in feature_ids {
        if let Some(feature) = tx.feature(*feature_id)? {
            epic_ids.insert(feature.epic_id());
            refresh_feature(tx, workflow, feature, now)?;
        }
    }
    for epic_id in epic_ids {
        refresh_epic(tx, workflow, epic_id, now)?;
    }
    Ok(())
}

pub(super) fn refresh_feature(
    tx: &mut dyn HierarchyTransaction,
    workflow: &WorkflowDefinition,
    feature: Feature,
    now: DateTime<Utc>,
) -> TaskLifecycleResult<(Feature, FeatureProgress)> {
    let tasks = tx.tasks_in_feature(feature.id())?;
    let progress = ProgressAggregator::new(workflow).feature_progress(feature.id(), &tasks);
    let mut updated = feature;
    if updated.record_progress(progress.progress_pct, progress.derived_status, now) {
        debug!(feature = %updated.key(), status = %updated.status(), "feature roll-up changed");
        updated = tx.update_feature(&updated)?;
    }
    Ok((updated, progress))
}

pub(super) fn refresh_epic(
    tx: &mut dyn HierarchyTransaction,
    workflow: &WorkflowDefinition,
    epic_id: EpicId,
    now: DateTime<Utc>,
) -> TaskLifecycleResult<Option<EpicProgress>> {
    let Some(mut epic) = tx.epic(epic_id)? else {
        return Ok(None);
    };
    let progress = epic_rollup(tx, workflow, epic_id)?;
    if epic.record_progress(progress.progress_pct, progress.derived_status, now) {
        debug!(epic = %epic.key(), status = %epic.status(), "epic roll-up changed");
        tx.update_epic(&epic)?;
    }
    Ok(Some(progress))
}

pub(super) fn epic_rollup(
    tx: &mut dyn HierarchyTransaction,
    workflow: &WorkflowDefinition,
    epic_id: EpicId,
) -> TaskLifecycleResult<EpicProgress> {
    let aggregator = ProgressAggregator::new(workflow);
    let features = tx.features_in_epic(epic_id)?;
    let mut inputs = Vec::with_capacity(features.len());
    for feature in &features {
        let tasks = tx.tasks_in_feature(feature.id())?;
        inputs.push((aggregator.feature_progress(feature.id(), &tasks), feature.status()));
    }
    Ok(aggregator.epic_progress(epic_id, &inputs))
}

/// Moves a task within its feature and rewrites every sibling whose
/// position changed.
pub(super) fn resequence_tasks(
    tx: &mut dyn HierarchyTransaction,
    feature_id: FeatureId,
    moved: TaskId,
    target: Option<u32>,
    now: DateTime<Utc>,
) -> TaskLifecycleResult<Vec<Task>> {
    let siblings = tx.tasks_in_feature(feature_id)?;
    let items: Vec<SequenceItem<TaskId>> = siblings
        .iter()
        .map(|task| SequenceItem::new(task.id(), task.execution_order().map(ExecutionOrder::value)))
        .collect();
    let reordered = resequence(&items, &moved, target);

    let mut result = Vec::with_capacity(siblings.len());
    for (sibling, item) in siblings.into_iter().zip(reordered) {
        let position = item.ordinal.and_then(ExecutionOrder::from_position);
        if sibling.execution_order() == position {
            result.push(sibling);
        } else {
            let mut updated = sibling;
            updated.set_execution_order(position, now);
            result.push(tx.update_task(&updated)?);
        }
    }
    Ok(result)
}

/// Moves a feature within its epic and rewrites every sibling whose
/// position changed.
pub(super) fn resequence_features(
    tx: &mut dyn HierarchyTransaction,
    epic_id: EpicId,
    moved: FeatureId,
    target: Option<u32>,
    now: DateTime<Utc>,
) -> TaskLifecycleResult<Vec<Feature>> {
    let siblings = tx.features_in_epic(epic_id)?;
    let items: Vec<SequenceItem<FeatureId>> = siblings
        .iter()
        .map(|feature| {
            SequenceItem::new(feature.id(), feature.execution_order().map(ExecutionOrder::value))
        })
        .collect();
    let reordered = resequence(&items, &moved, target);

    let mut result = Vec::with_capacity(siblings.len());
    for (sibling, item) in siblings.into_iter().zip(reordered) {
        let position = item.ordinal.and_then(ExecutionOrder::from_position);
        if sibling.execution_order() == position {
            result.push(sibling);
        } else {
            let mut updated = sibling;
            updated.set_execution_order(position, now);
            result.push(tx.update_feature(&updated)?);
        }
    }
    Ok(result)
}

/// Removes deleted keys from every remaining task's prerequisites.
pub(super) fn scrub_dependencies(
    tx: &mut dyn HierarchyTransaction,
    removed: &BTreeSet<TaskKey>,
    now: DateTime<Utc>,
) -> TaskLifecycleResult<()> {
    if removed.is_empty() {
        return Ok(());
    }
    for task in tx.all_tasks()? {
        if !task.depends_on().iter().any(|key| removed.contains(key)) {
            continue;
        }
        let remaining = task
            .depends_on()
            .iter()
            .filter(|key| !removed.contains(*key))
            .cloned()
            .collect();
        let mut updated = task;
        updated.replace_dependencies(remaining, now);
        tx.update_task(&updated)?;
    }
    Ok(())
}

/// Converts a requested position to the resequencer's range; anything at
/// or below zero means first.
pub(super) fn clamp_position(position: i64) -> u32 {
    u32::try_from(position.max(0)).unwrap_or(u32::MAX)
}
