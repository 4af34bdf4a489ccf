//! Structural validation of workflow documents.
//!
//! A document is accepted only when every status it mentions is defined,
//! every status is reachable from a start status, and every status can reach
//! a complete status.

use super::{
    AWAITING_APPROVAL_STATUS_KEY, BLOCKED_STATUS_KEY, COMPLETE_STATUS_KEY,
    DEFAULT_WORKFLOW_VERSION, START_STATUS_KEY, WorkflowDocument, WorkflowError,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Validates the structure of a workflow document.
///
/// # Errors
///
/// Returns the first [`WorkflowError`] found, checking in order: version,
/// status names, special statuses, transition targets, metadata keys, progress
/// weights, orchestrator actions, phase order, reachability from start and
/// reachability of a complete status.
pub fn validate_document(document: &WorkflowDocument) -> Result<(), WorkflowError> {
    if let Some(version) = &document.version
        && version != DEFAULT_WORKFLOW_VERSION
    {
        return Err(WorkflowError::UnsupportedVersion(version.clone()));
    }
    if document.status_flow.keys().any(|status| status.trim().is_empty()) {
        return Err(WorkflowError::EmptyStatusName);
    }

    validate_special_statuses(document)?;
    validate_transition_targets(document)?;
    validate_metadata(document)?;
    validate_phase_order(document)?;

    let unreachable = unreachable_from_start(document);
    if !unreachable.is_empty() {
        return Err(WorkflowError::UnreachableStatuses(unreachable));
    }

    let dead_ends = unable_to_complete(document);
    if !dead_ends.is_empty() {
        return Err(WorkflowError::DeadEndStatuses(dead_ends));
    }

    Ok(())
}

fn validate_special_statuses(document: &WorkflowDocument) -> Result<(), WorkflowError> {
    for required in [START_STATUS_KEY, COMPLETE_STATUS_KEY] {
        if document.special(required).is_empty() {
            return Err(WorkflowError::MissingSpecialStatus(required.to_owned()));
        }
    }

    for role in [
        START_STATUS_KEY,
        COMPLETE_STATUS_KEY,
        BLOCKED_STATUS_KEY,
        AWAITING_APPROVAL_STATUS_KEY,
    ] {
        if let Some(status) = document
            .special(role)
            .iter()
            .find(|status| !document.status_flow.contains_key(status.as_str()))
        {
            return Err(WorkflowError::UndefinedSpecialStatus {
                role: role.to_owned(),
                status: status.clone(),
            });
        }
    }
    Ok(())
}

fn validate_transition_targets(document: &WorkflowDocument) -> Result<(), WorkflowError> {
    let undefined: BTreeSet<String> = document
        .status_flow
        .iter()
        .flat_map(|(from, targets)| {
            targets
                .iter()
                .filter(|target| !document.status_flow.contains_key(target.as_str()))
                .map(move |target| format!("{from} -> {target}"))
        })
        .collect();

    if undefined.is_empty() {
        return Ok(());
    }
    Err(WorkflowError::UndefinedTransitionTargets(
        undefined.into_iter().collect(),
    ))
}

fn validate_metadata(document: &WorkflowDocument) -> Result<(), WorkflowError> {
    for (status, metadata) in &document.status_metadata {
        if !document.status_flow.contains_key(status) {
            return Err(WorkflowError::UndefinedMetadataStatus(status.clone()));
        }
        if let Some(weight) = metadata.progress_weight
            && !(0.0..=1.0).contains(&weight)
        {
            return Err(WorkflowError::InvalidProgressWeight {
                status: status.clone(),
            });
        }
        if let Some(action) = &metadata.orchestrator_action {
            action.validate(status)?;
        }
    }
    Ok(())
}

fn validate_phase_order(document: &WorkflowDocument) -> Result<(), WorkflowError> {
    let Some(phases) = &document.phase_order else {
        return Ok(());
    };
    let mut seen = BTreeSet::new();
    for phase in phases {
        if !seen.insert(phase.as_str()) {
            return Err(WorkflowError::DuplicatePhase(phase.clone()));
        }
    }
    Ok(())
}

fn unreachable_from_start(document: &WorkflowDocument) -> Vec<String> {
    let reached = breadth_first(document.special(START_STATUS_KEY), &document.status_flow);
    document
        .status_flow
        .keys()
        .filter(|status| !reached.contains(status.as_str()))
        .cloned()
        .collect()
}

fn unable_to_complete(document: &WorkflowDocument) -> Vec<String> {
    let mut reverse: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (from, targets) in &document.status_flow {
        for target in targets {
            reverse.entry(target.clone()).or_default().push(from.clone());
        }
    }

    let reached = breadth_first(document.special(COMPLETE_STATUS_KEY), &reverse);
    document
        .status_flow
        .keys()
        .filter(|status| !reached.contains(status.as_str()))
        .cloned()
        .collect()
}

fn breadth_first<'a>(
    roots: &'a [String],
    edges: &'a BTreeMap<String, Vec<String>>,
) -> BTreeSet<&'a str> {
    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut queue: VecDeque<&str> = roots.iter().map(String::as_str).collect();

    while let Some(status) = queue.pop_front() {
        if !visited.insert(status) {
            continue;
        }
        if let Some(next) = edges.get(status) {
            queue.extend(next.iter().map(String::as_str));
        }
    }
    visited
}
