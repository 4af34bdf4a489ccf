//! Service entry points for sibling execution order.

use super::{
    TaskLifecycleResult, TaskLifecycleService,
    support::{clamp_position, require_feature, require_task, resequence_features, resequence_tasks},
};
use crate::task::{
    domain::{Feature, FeatureKey, Task, TaskKey},
    ports::{HierarchyRepository, HierarchyTransaction},
};
use mockable::Clock;
use tracing::info;

impl<R, C> TaskLifecycleService<R, C>
where
    R: HierarchyRepository,
    C: Clock + Send + Sync,
{
    /// Moves a task to `position` among its feature's ordered tasks.
    ///
    /// Positions at or below zero place the task first and positions past
    /// the end place it last; `None` removes it from the ordering. Every
    /// ordered sibling is renumbered densely from 1.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown task.
    pub async fn reorder_task(
        &self,
        task_key: &TaskKey,
        position: Option<i64>,
    ) -> TaskLifecycleResult<Vec<Task>> {
        let key = task_key.clone();
        let target = position.map(clamp_position);
        let now = self.clock.utc();
        self.repository
            .transaction(move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Vec<Task>> {
                let task = require_task(tx, &key)?;
                let siblings = resequence_tasks(tx, task.feature_id(), task.id(), target, now)?;
                info!(task = %key, position = ?target, "task reordered");
                Ok(siblings)
            })
            .await
    }

    /// Moves a feature to `position` among its epic's ordered features.
    ///
    /// Follows the same rules as [`Self::reorder_task`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown feature.
    pub async fn reorder_feature(
        &self,
        feature_key: &FeatureKey,
        position: Option<i64>,
    ) -> TaskLifecycleResult<Vec<Feature>> {
        let key = feature_key.clone();
        let target = position.map(clamp_position);
        let now = self.clock.utc();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Vec<Feature>> {
                    let feature = require_feature(tx, &key)?;
                    let siblings =
                        resequence_features(tx, feature.epic_id(), feature.id(), target, now)?;
                    info!(feature = %key, position = ?target, "feature reordered");
                    Ok(siblings)
                },
            )
            .await
    }
}
