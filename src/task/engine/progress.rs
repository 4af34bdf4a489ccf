//! Bottom-up progress aggregation.
//!
//! A task contributes 100 when its status is complete and 0 otherwise. A
//! feature's percentage is the mean over its tasks; an epic's is the mean
//! over its features weighted by task count. Weighted progress applies the
//! workflow's per-status progress weights instead of the binary rule.

use crate::task::domain::{ContainerStatus, EpicId, FeatureId, Task};
use crate::workflow::domain::WorkflowDefinition;
use std::collections::BTreeMap;

const FULL: f64 = 100.0;

/// Roll-up of one feature's tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureProgress {
    /// Feature the roll-up describes.
    pub feature_id: FeatureId,
    /// Number of tasks in the feature.
    pub task_count: u32,
    /// Number of tasks in a complete status.
    pub completed_count: u32,
    /// Completion percentage in `[0, 100]`.
    pub progress_pct: f64,
    /// Progress using per-status weights, in `[0, 100]`.
    pub weighted_pct: f64,
    /// Number of tasks per status.
    pub status_counts: BTreeMap<String, u32>,
    /// Status implied by the task statuses.
    pub derived_status: ContainerStatus,
}

/// Roll-up of one epic's features.
#[derive(Debug, Clone, PartialEq)]
pub struct EpicProgress {
    /// Epic the roll-up describes.
    pub epic_id: EpicId,
    /// Number of features in the epic.
    pub feature_count: u32,
    /// Number of tasks across all features.
    pub task_count: u32,
    /// Completion percentage in `[0, 100]`, weighted by task count.
    pub progress_pct: f64,
    /// Weighted progress, weighted by task count.
    pub weighted_pct: f64,
    /// Number of features per status.
    pub feature_status_counts: BTreeMap<ContainerStatus, u32>,
    /// Status implied by the feature statuses.
    pub derived_status: ContainerStatus,
}

/// Computes task, feature and epic progress for a workflow.
#[derive(Debug, Clone, Copy)]
pub struct ProgressAggregator<'a> {
    workflow: &'a WorkflowDefinition,
}

impl<'a> ProgressAggregator<'a> {
    /// Creates an aggregator for the workflow.
    #[must_use]
    pub const fn new(workflow: &'a WorkflowDefinition) -> Self {
        Self { workflow }
    }

    /// Returns a task's contribution: 100 when complete, otherwise 0.
    #[must_use]
    pub fn task_progress(&self, task: &Task) -> f64 {
        if task.is_terminal(self.workflow) {
            FULL
        } else {
            0.0
        }
    }

    /// Rolls up the tasks of one feature.
    #[must_use]
    pub fn feature_progress(&self, feature_id: FeatureId, tasks: &[Task]) -> FeatureProgress {
        let mut status_counts: BTreeMap<String, u32> = BTreeMap::new();
        let mut completed_count = 0_u32;
        let mut weighted_sum = 0.0_f64;
        let mut task_count = 0_u32;

        for task in tasks.iter().filter(|task| task.feature_id() == feature_id) {
            let status = task.status().as_str();
            let count = status_counts.entry(status.to_owned()).or_default();
            *count = count.saturating_add(1);
            task_count = task_count.saturating_add(1);
            if task.is_terminal(self.workflow) {
                completed_count = completed_count.saturating_add(1);
            }
            weighted_sum = add(weighted_sum, self.workflow.progress_weight(status));
        }

        let progress_pct = percentage(f64::from(completed_count), task_count);
        let weighted_pct = percentage(weighted_sum, task_count);
        let derived = self.derive_feature_status(&status_counts, task_count, completed_count);
        FeatureProgress {
            feature_id,
            task_count,
            completed_count,
            progress_pct,
            weighted_pct,
            status_counts,
            derived_status: derived,
        }
    }

    /// Rolls up the features of one epic.
    ///
    /// `features` pairs each feature's roll-up with its current status, which
    /// may differ from the derived one when overridden or archived.
    #[must_use]
    pub fn epic_progress(
        &self,
        epic_id: EpicId,
        features: &[(FeatureProgress, ContainerStatus)],
    ) -> EpicProgress {
        let mut feature_status_counts: BTreeMap<ContainerStatus, u32> = BTreeMap::new();
        let mut task_count = 0_u32;
        let mut pct_sum = 0.0_f64;
        let mut weighted_sum = 0.0_f64;
        let mut feature_count = 0_u32;

        for (progress, status) in features {
            let count = feature_status_counts.entry(*status).or_default();
            *count = count.saturating_add(1);
            feature_count = feature_count.saturating_add(1);
            task_count = task_count.saturating_add(progress.task_count);
            pct_sum = add(pct_sum, scale(progress.progress_pct, progress.task_count));
            weighted_sum = add(weighted_sum, scale(progress.weighted_pct, progress.task_count));
        }

        EpicProgress {
            epic_id,
            feature_count,
            task_count,
            progress_pct: mean(pct_sum, task_count),
            weighted_pct: mean(weighted_sum, task_count),
            derived_status: derive_epic_status(&feature_status_counts, feature_count),
            feature_status_counts,
        }
    }

    fn derive_feature_status(
        &self,
        status_counts: &BTreeMap<String, u32>,
        task_count: u32,
        completed_count: u32,
    ) -> ContainerStatus {
        if task_count == 0 {
            return ContainerStatus::Draft;
        }
        if completed_count == task_count {
            return ContainerStatus::Completed;
        }

        let mut in_flight = false;
        let mut not_started = 0_u32;
        for (status, count) in status_counts {
            if self.workflow.is_complete_status(status) {
                continue;
            }
            if self.workflow.is_start_status(status) {
                not_started = not_started.saturating_add(*count);
            } else {
                in_flight = true;
            }
        }

        if in_flight || (completed_count > 0 && not_started > 0) {
            ContainerStatus::Active
        } else {
            ContainerStatus::Draft
        }
    }
}

fn derive_epic_status(counts: &BTreeMap<ContainerStatus, u32>, feature_count: u32) -> ContainerStatus {
    let count_of = |status: ContainerStatus| counts.get(&status).copied().unwrap_or(0);
    if feature_count == 0 {
        return ContainerStatus::Draft;
    }
    let finished = count_of(ContainerStatus::Completed).saturating_add(count_of(ContainerStatus::Archived));
    if finished == feature_count {
        return ContainerStatus::Completed;
    }
    if count_of(ContainerStatus::Active) > 0 {
        return ContainerStatus::Active;
    }
    if finished > 0 && count_of(ContainerStatus::Draft) > 0 {
        return ContainerStatus::Active;
    }
    ContainerStatus::Draft
}

#[expect(clippy::float_arithmetic, reason = "progress sums are floating point")]
fn add(total: f64, value: f64) -> f64 {
    total + value
}

#[expect(clippy::float_arithmetic, reason = "progress weighting is floating point")]
fn scale(pct: f64, count: u32) -> f64 {
    pct * f64::from(count)
}

#[expect(clippy::float_arithmetic, reason = "percentages are floating point")]
fn percentage(numerator: f64, count: u32) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (numerator / f64::from(count) * FULL).clamp(0.0, FULL)
}

#[expect(clippy::float_arithmetic, reason = "weighted means are floating point")]
fn mean(sum: f64, count: u32) -> f64 {
    if count == 0 {
        return 0.0;
    }
    (sum / f64::from(count)).clamp(0.0, FULL)
}
