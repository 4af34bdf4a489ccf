//! Service entry points for progress reporting.

use super::{
    TaskLifecycleResult, TaskLifecycleService,
    support::{epic_rollup, refresh_epic, refresh_feature, refresh_rollups, require_epic, require_feature, require_task},
};
use crate::task::{
    domain::{ContainerStatus, EpicKey, Feature, FeatureKey, TaskKey},
    engine::{EpicProgress, FeatureProgress, ProgressAggregator},
    ports::{HierarchyRepository, HierarchyTransaction},
};
use mockable::Clock;
use std::collections::BTreeSet;
use tracing::info;

impl<R, C> TaskLifecycleService<R, C>
where
    R: HierarchyRepository,
    C: Clock + Send + Sync,
{
    /// Returns a task's progress: 100 when complete, otherwise 0.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown task.
    pub async fn task_progress(&self, task_key: &TaskKey) -> TaskLifecycleResult<f64> {
        let workflow = std::sync::Arc::clone(&self.workflow);
        let key = task_key.clone();
        self.repository
            .transaction(move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<f64> {
                let task = require_task(tx, &key)?;
                Ok(ProgressAggregator::new(&workflow).task_progress(&task))
            })
            .await
    }

    /// Computes a feature's progress from its tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown feature.
    pub async fn feature_progress(
        &self,
        feature_key: &FeatureKey,
    ) -> TaskLifecycleResult<FeatureProgress> {
        let workflow = std::sync::Arc::clone(&self.workflow);
        let key = feature_key.clone();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<FeatureProgress> {
                    let feature = require_feature(tx, &key)?;
                    let tasks = tx.tasks_in_feature(feature.id())?;
                    Ok(ProgressAggregator::new(&workflow).feature_progress(feature.id(), &tasks))
                },
            )
            .await
    }

    /// Computes an epic's progress from its features, weighted by task
    /// count.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown epic.
    pub async fn epic_progress(&self, epic_key: &EpicKey) -> TaskLifecycleResult<EpicProgress> {
        let workflow = std::sync::Arc::clone(&self.workflow);
        let key = epic_key.clone();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<EpicProgress> {
                    let epic = require_epic(tx, &key)?;
                    epic_rollup(tx, &workflow, epic.id())
                },
            )
            .await
    }

    /// Recomputes and caches progress and derived status for every feature
    /// and epic.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`](super::TaskLifecycleError::Repository)
    /// when persistence fails.
    pub async fn refresh_progress(&self) -> TaskLifecycleResult<Vec<EpicProgress>> {
        let workflow = std::sync::Arc::clone(&self.workflow);
        let now = self.clock.utc();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Vec<EpicProgress>> {
                    let epics = tx.all_epics()?;
                    let mut reports = Vec::with_capacity(epics.len());
                    for epic in epics {
                        for feature in tx.features_in_epic(epic.id())? {
                            refresh_feature(tx, &workflow, feature, now)?;
                        }
                        if let Some(report) = refresh_epic(tx, &workflow, epic.id(), now)? {
                            reports.push(report);
                        }
                    }
                    info!(epics = reports.len(), "progress refreshed");
                    Ok(reports)
                },
            )
            .await
    }

    /// Sets a feature's status manually.
    ///
    /// `Some(status)` pins the status so roll-ups no longer change it;
    /// `None` releases the pin and re-derives the status from the tasks.
    /// The epic roll-up is refreshed either way.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown feature.
    pub async fn set_status_override(
        &self,
        feature_key: &FeatureKey,
        status: Option<ContainerStatus>,
    ) -> TaskLifecycleResult<Feature> {
        let workflow = std::sync::Arc::clone(&self.workflow);
        let key = feature_key.clone();
        let now = self.clock.utc();
        self.repository
            .transaction(move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Feature> {
                let mut feature = require_feature(tx, &key)?;
                let pinned = status.is_some();
                feature.override_status(status.unwrap_or(feature.status()), pinned, now);
                let stored = tx.update_feature(&feature)?;
                info!(feature = %key, status = %stored.status(), pinned, "feature status overridden");

                refresh_rollups(tx, &workflow, &BTreeSet::from([stored.id()]), now)?;
                tx.feature(stored.id())?
                    .ok_or_else(|| super::TaskLifecycleError::not_found("feature", &key))
            })
            .await
    }
}
