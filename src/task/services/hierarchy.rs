//! Service entry points for creating, finding and deleting hierarchy
//! entities.

use super::{
    TaskLifecycleResult, TaskLifecycleService,
    support::{
        refresh_epic, refresh_rollups, require_epic, require_feature,
        require_task, resequence_features, resequence_tasks, scrub_dependencies,
    },
};
use crate::task::{
    domain::{
        DependencyList, Epic, EpicKey, ExecutionOrder, Feature, FeatureKey, NewEpic, NewFeature,
        NewTask, NewTaskHistory, Task, TaskDomainError, TaskKey, TaskStatus,
    },
    engine::DependencyValidator,
    ports::{HierarchyRepository, HierarchyTransaction},
};
use mockable::Clock;
use std::collections::BTreeSet;
use tracing::info;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    feature: FeatureKey,
    key: TaskKey,
    title: String,
    depends_on: Vec<String>,
    execution_order: Option<i64>,
    actor: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(feature: FeatureKey, key: TaskKey, title: impl Into<String>) -> Self {
        Self {
            feature,
            key,
            title: title.into(),
            depends_on: Vec::new(),
            execution_order: None,
            actor: None,
        }
    }

    /// Sets the prerequisite task keys.
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = depends_on.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the requested position among the feature's ordered tasks.
    #[must_use]
    pub const fn with_execution_order(mut self, execution_order: i64) -> Self {
        self.execution_order = Some(execution_order);
        self
    }

    /// Sets the creating actor recorded on the first history row.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: HierarchyRepository,
    C: Clock + Send + Sync,
{
    /// Creates an epic.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`](super::TaskLifecycleError::Domain)
    /// for a blank title or
    /// [`TaskLifecycleError::Repository`](super::TaskLifecycleError::Repository)
    /// when the key is taken.
    pub async fn create_epic(&self, key: EpicKey, title: &str) -> TaskLifecycleResult<Epic> {
        let new_epic = NewEpic::new(key, title, self.clock.utc())?;
        self.repository
            .transaction(move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Epic> {
                let epic = tx.insert_epic(new_epic)?;
                info!(epic = %epic.key(), "epic created");
                Ok(epic)
            })
            .await
    }

    /// Creates a feature inside an epic, optionally at a position among its
    /// siblings.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown epic or
    /// [`TaskLifecycleError::Domain`](super::TaskLifecycleError::Domain) for
    /// a blank title or non-positive position.
    pub async fn create_feature(
        &self,
        epic_key: &EpicKey,
        key: FeatureKey,
        title: &str,
        execution_order: Option<i64>,
    ) -> TaskLifecycleResult<Feature> {
        let workflow = std::sync::Arc::clone(&self.workflow);
        let now = self.clock.utc();
        let order = execution_order.map(ExecutionOrder::new).transpose()?;
        let title_text = title.to_owned();
        let epic = epic_key.clone();
        self.repository
            .transaction(move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Feature> {
                let parent = require_epic(tx, &epic)?;
                let mut new_feature = NewFeature::new(parent.id(), key, title_text, now)?;
                if let Some(position) = order {
                    new_feature = new_feature.with_execution_order(position);
                }
                let created = tx.insert_feature(new_feature)?;
                if let Some(position) = order {
                    resequence_features(tx, parent.id(), created.id(), Some(position.value()), now)?;
                }
                refresh_epic(tx, &workflow, parent.id(), now)?;
                info!(feature = %created.key(), epic = %epic, "feature created");
                tx.feature(created.id())?
                    .ok_or_else(|| super::TaskLifecycleError::not_found("feature", created.key()))
            })
            .await
    }

    /// Creates a task in the workflow's initial status.
    ///
    /// Prerequisites are validated like [`Self::update_dependencies`]; an
    /// explicit position renumbers the feature's ordered tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown feature,
    /// [`TaskLifecycleError::Dependency`](super::TaskLifecycleError::Dependency)
    /// for invalid prerequisites, or
    /// [`TaskLifecycleError::Domain`](super::TaskLifecycleError::Domain) for
    /// a blank title or non-positive position.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let workflow = std::sync::Arc::clone(&self.workflow);
        let now = self.clock.utc();
        let CreateTaskRequest {
            feature,
            key,
            title,
            depends_on: raw_dependencies,
            execution_order,
            actor,
        } = request;
        let order = execution_order.map(ExecutionOrder::new).transpose()?;
        let depends_on = DependencyList::from_raw(key.as_str(), raw_dependencies)?;
        let initial = workflow.initial_status().unwrap_or_default();
        let status = TaskStatus::known(initial, &workflow)
            .ok_or_else(|| TaskDomainError::UnknownStatus(initial.to_owned()))?;

        self.repository
            .transaction(move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Task> {
                let parent = require_feature(tx, &feature)?;
                DependencyValidator::new(&tx.all_tasks()?).validate(&key, &depends_on)?;

                let mut new_task = NewTask::new(parent.id(), key, title, status.clone(), now)?
                    .with_dependencies(depends_on);
                if let Some(position) = order {
                    new_task = new_task.with_execution_order(position);
                }
                let created = tx.insert_task(new_task)?;
                tx.append_history(NewTaskHistory::creation(created.id(), status, actor, now))?;
                if let Some(position) = order {
                    resequence_tasks(tx, parent.id(), created.id(), Some(position.value()), now)?;
                }
                refresh_rollups(tx, &workflow, &BTreeSet::from([parent.id()]), now)?;
                info!(task = %created.key(), feature = %parent.key(), "task created");
                tx.task(created.id())?
                    .ok_or_else(|| super::TaskLifecycleError::not_found("task", created.key()))
            })
            .await
    }

    /// Finds an epic by key.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`](super::TaskLifecycleError::Repository)
    /// when persistence fails.
    pub async fn find_epic(&self, key: &EpicKey) -> TaskLifecycleResult<Option<Epic>> {
        let lookup = key.clone();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Option<Epic>> {
                    Ok(tx.epic_by_key(&lookup)?)
                },
            )
            .await
    }

    /// Finds a feature by key.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`](super::TaskLifecycleError::Repository)
    /// when persistence fails.
    pub async fn find_feature(&self, key: &FeatureKey) -> TaskLifecycleResult<Option<Feature>> {
        let lookup = key.clone();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Option<Feature>> {
                    Ok(tx.feature_by_key(&lookup)?)
                },
            )
            .await
    }

    /// Finds a task by key.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`](super::TaskLifecycleError::Repository)
    /// when persistence fails.
    pub async fn find_task(&self, key: &TaskKey) -> TaskLifecycleResult<Option<Task>> {
        let lookup = key.clone();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Option<Task>> {
                    Ok(tx.task_by_key(&lookup)?)
                },
            )
            .await
    }

    /// Lists a feature's tasks, ordered tasks first by position.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown feature.
    pub async fn list_tasks(&self, feature_key: &FeatureKey) -> TaskLifecycleResult<Vec<Task>> {
        let lookup = feature_key.clone();
        self.repository
            .transaction(move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Vec<Task>> {
                let feature = require_feature(tx, &lookup)?;
                let mut tasks = tx.tasks_in_feature(feature.id())?;
                tasks.sort_by_key(|task| (task.execution_order().is_none(), task.execution_order(), task.id()));
                Ok(tasks)
            })
            .await
    }

    /// Lists an epic's features, ordered features first by position.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown epic.
    pub async fn list_features(&self, epic_key: &EpicKey) -> TaskLifecycleResult<Vec<Feature>> {
        let lookup = epic_key.clone();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Vec<Feature>> {
                    let epic = require_epic(tx, &lookup)?;
                    let mut features = tx.features_in_epic(epic.id())?;
                    features.sort_by_key(|feature| {
                        (feature.execution_order().is_none(), feature.execution_order(), feature.id())
                    });
                    Ok(features)
                },
            )
            .await
    }

    /// Deletes a task.
    ///
    /// The task's history goes with it, its key is removed from every other
    /// task's prerequisites, its siblings are renumbered and the roll-ups
    /// are refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown task.
    pub async fn delete_task(&self, key: &TaskKey) -> TaskLifecycleResult<()> {
        let workflow = std::sync::Arc::clone(&self.workflow);
        let lookup = key.clone();
        let now = self.clock.utc();
        self.repository
            .transaction(move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<()> {
                let task = require_task(tx, &lookup)?;
                resequence_tasks(tx, task.feature_id(), task.id(), None, now)?;
                tx.delete_task(task.id())?;
                scrub_dependencies(tx, &BTreeSet::from([lookup.clone()]), now)?;
                refresh_rollups(tx, &workflow, &BTreeSet::from([task.feature_id()]), now)?;
                info!(task = %lookup, "task deleted");
                Ok(())
            })
            .await
    }

    /// Deletes a feature with all of its tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown feature.
    pub async fn delete_feature(&self, key: &FeatureKey) -> TaskLifecycleResult<()> {
        let workflow = std::sync::Arc::clone(&self.workflow);
        let lookup = key.clone();
        let now = self.clock.utc();
        self.repository
            .transaction(move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<()> {
                let feature = require_feature(tx, &lookup)?;
                let removed: BTreeSet<TaskKey> = tx
                    .tasks_in_feature(feature.id())?
                    .into_iter()
                    .map(|task| task.key().clone())
                    .collect();
                resequence_features(tx, feature.epic_id(), feature.id(), None, now)?;
                tx.delete_feature(feature.id())?;
                scrub_dependencies(tx, &removed, now)?;
                refresh_epic(tx, &workflow, feature.epic_id(), now)?;
                info!(feature = %lookup, tasks = removed.len(), "feature deleted");
                Ok(())
            })
            .await
    }

    /// Deletes an epic with all of its features and tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown epic.
    pub async fn delete_epic(&self, key: &EpicKey) -> TaskLifecycleResult<()> {
        let lookup = key.clone();
        let now = self.clock.utc();
        self.repository
            .transaction(move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<()> {
                let epic = require_epic(tx, &lookup)?;
                let mut removed: BTreeSet<TaskKey> = BTreeSet::new();
                for feature in tx.features_in_epic(epic.id())? {
                    removed.extend(
                        tx.tasks_in_feature(feature.id())?
                            .into_iter()
                            .map(|task| task.key().clone()),
                    );
                }
                tx.delete_epic(epic.id())?;
                scrub_dependencies(tx, &removed, now)?;
                info!(epic = %lookup, tasks = removed.len(), "epic deleted");
                Ok(())
            })
            .await
    }
}
