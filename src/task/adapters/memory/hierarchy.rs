//! In-memory implementation of the hierarchy repository.
//!
//! Transactions run against a scratch copy of the state while holding the
//! write lock; the copy replaces the live state only when the closure
//! succeeds.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::task::{
    domain::{
        Epic, EpicId, EpicKey, Feature, FeatureId, FeatureKey, HistoryId, NewEpic, NewFeature,
        NewTask, NewTaskHistory, Revision, Task, TaskHistory, TaskId, TaskKey,
    },
    ports::{
        HierarchyRepository, HierarchyRepositoryError, HierarchyRepositoryResult,
        HierarchyTransaction,
    },
};

/// Thread-safe in-memory hierarchy repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHierarchyRepository {
    state: Arc<RwLock<HierarchyState>>,
}

#[derive(Debug, Clone, Default)]
struct HierarchyState {
    epics: BTreeMap<EpicId, Epic>,
    features: BTreeMap<FeatureId, Feature>,
    tasks: BTreeMap<TaskId, Task>,
    history: Vec<TaskHistory>,
    sequence: i64,
}

impl InMemoryHierarchyRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.state
            .read()
            .map(|guard| guard.tasks.len())
            .unwrap_or(0)
    }

    /// Returns the number of stored history rows.
    #[must_use]
    pub fn history_count(&self) -> usize {
        self.state
            .read()
            .map(|guard| guard.history.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl HierarchyRepository for InMemoryHierarchyRepository {
    async fn transaction<F, T, E>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn HierarchyTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<HierarchyRepositoryError> + Send + 'static,
    {
        let mut guard = self.state.write().map_err(|err| {
            E::from(HierarchyRepositoryError::persistence(std::io::Error::other(
                err.to_string(),
            )))
        })?;
        let mut scratch = guard.clone();
        let outcome = work(&mut scratch)?;
        *guard = scratch;
        Ok(outcome)
    }
}

impl HierarchyState {
    const fn next_id(&mut self) -> i64 {
        self.sequence = self.sequence.saturating_add(1);
        self.sequence
    }
}

fn check_revision(
    entity: &'static str,
    key: &dyn std::fmt::Display,
    stored: Revision,
    expected: Revision,
) -> HierarchyRepositoryResult<Revision> {
    if stored == expected {
        Ok(stored.next())
    } else {
        Err(HierarchyRepositoryError::ConcurrentModification {
            entity,
            key: key.to_string(),
        })
    }
}

impl HierarchyTransaction for HierarchyState {
    fn epic(&mut self, id: EpicId) -> HierarchyRepositoryResult<Option<Epic>> {
        Ok(self.epics.get(&id).cloned())
    }

    fn epic_by_key(&mut self, key: &EpicKey) -> HierarchyRepositoryResult<Option<Epic>> {
        Ok(self.epics.values().find(|epic| epic.key() == key).cloned())
    }

    fn all_epics(&mut self) -> HierarchyRepositoryResult<Vec<Epic>> {
        Ok(self.epics.values().cloned().collect())
    }

    fn feature(&mut self, id: FeatureId) -> HierarchyRepositoryResult<Option<Feature>> {
        Ok(self.features.get(&id).cloned())
    }

    fn feature_by_key(&mut self, key: &FeatureKey) -> HierarchyRepositoryResult<Option<Feature>> {
        Ok(self
            .features
            .values()
            .find(|feature| feature.key() == key)
            .cloned())
    }

    fn features_in_epic(&mut self, epic_id: EpicId) -> HierarchyRepositoryResult<Vec<Feature>> {
        Ok(self
            .features
            .values()
            .filter(|feature| feature.epic_id() == epic_id)
            .cloned()
            .collect())
    }

    fn task(&mut self, id: TaskId) -> HierarchyRepositoryResult<Option<Task>> {
        Ok(self.tasks.get(&id).cloned())
    }

    fn task_by_key(&mut self, key: &TaskKey) -> HierarchyRepositoryResult<Option<Task>> {
        Ok(self.tasks.values().find(|task| task.key() == key).cloned())
    }

    fn tasks_in_feature(&mut self, feature_id: FeatureId) -> HierarchyRepositoryResult<Vec<Task>> {
        Ok(self
            .tasks
            .values()
            .filter(|task| task.feature_id() == feature_id)
            .cloned()
            .collect())
    }

    fn all_tasks(&mut self) -> HierarchyRepositoryResult<Vec<Task>> {
        Ok(self.tasks.values().cloned().collect())
    }

    fn history_for_task(&mut self, task_id: TaskId) -> HierarchyRepositoryResult<Vec<TaskHistory>> {
        Ok(self
            .history
            .iter()
            .filter(|entry| entry.task_id == task_id)
            .cloned()
            .collect())
    }

    fn insert_epic(&mut self, epic: NewEpic) -> HierarchyRepositoryResult<Epic> {
        if self.epics.values().any(|existing| existing.key() == &epic.key) {
            return Err(HierarchyRepositoryError::DuplicateKey {
                entity: "epic",
                key: epic.key.to_string(),
            });
        }
        let stored = epic.into_epic(EpicId::new(self.next_id()));
        self.epics.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    fn insert_feature(&mut self, feature: NewFeature) -> HierarchyRepositoryResult<Feature> {
        if !self.epics.contains_key(&feature.epic_id) {
            return Err(HierarchyRepositoryError::not_found("epic", &feature.epic_id));
        }
        if self
            .features
            .values()
            .any(|existing| existing.key() == &feature.key)
        {
            return Err(HierarchyRepositoryError::DuplicateKey {
                entity: "feature",
                key: feature.key.to_string(),
            });
        }
        let stored = feature.into_feature(FeatureId::new(self.next_id()));
        self.features.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    fn insert_task(&mut self, task: NewTask) -> HierarchyRepositoryResult<Task> {
        if !self.features.contains_key(&task.feature_id) {
            return Err(HierarchyRepositoryError::not_found("feature", &task.feature_id));
        }
        if self.tasks.values().any(|existing| existing.key() == &task.key) {
            return Err(HierarchyRepositoryError::DuplicateKey {
                entity: "task",
                key: task.key.to_string(),
            });
        }
        let stored = task.into_task(TaskId::new(self.next_id()));
        self.tasks.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    fn update_epic(&mut self, epic: &Epic) -> HierarchyRepositoryResult<Epic> {
        let stored = self
            .epics
            .get_mut(&epic.id())
            .ok_or_else(|| HierarchyRepositoryError::not_found("epic", epic.key()))?;
        let revision = check_revision("epic", epic.key(), stored.revision(), epic.revision())?;
        *stored = epic.clone().with_revision(revision);
        Ok(stored.clone())
    }

    fn update_feature(&mut self, feature: &Feature) -> HierarchyRepositoryResult<Feature> {
        let stored = self
            .features
            .get_mut(&feature.id())
            .ok_or_else(|| HierarchyRepositoryError::not_found("feature", feature.key()))?;
        let revision = check_revision(
            "feature",
            feature.key(),
            stored.revision(),
            feature.revision(),
        )?;
        *stored = feature.clone().with_revision(revision);
        Ok(stored.clone())
    }

    fn update_task(&mut self, task: &Task) -> HierarchyRepositoryResult<Task> {
        let stored = self
            .tasks
            .get_mut(&task.id())
            .ok_or_else(|| HierarchyRepositoryError::not_found("task", task.key()))?;
        let revision = check_revision("task", task.key(), stored.revision(), task.revision())?;
        *stored = task.clone().with_revision(revision);
        Ok(stored.clone())
    }

    fn append_history(&mut self, entry: NewTaskHistory) -> HierarchyRepositoryResult<TaskHistory> {
        if !self.tasks.contains_key(&entry.task_id) {
            return Err(HierarchyRepositoryError::not_found("task", &entry.task_id));
        }
        let stored = entry.into_history(HistoryId::new(self.next_id()));
        self.history.push(stored.clone());
        Ok(stored)
    }

    fn delete_task(&mut self, id: TaskId) -> HierarchyRepositoryResult<()> {
        self.tasks
            .remove(&id)
            .ok_or_else(|| HierarchyRepositoryError::not_found("task", &id))?;
        self.history.retain(|entry| entry.task_id != id);
        Ok(())
    }

    fn delete_feature(&mut self, id: FeatureId) -> HierarchyRepositoryResult<()> {
        self.features
            .remove(&id)
            .ok_or_else(|| HierarchyRepositoryError::not_found("feature", &id))?;
        let removed: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|task| task.feature_id() == id)
            .map(Task::id)
            .collect();
        for task_id in removed {
            self.delete_task(task_id)?;
        }
        Ok(())
    }

    fn delete_epic(&mut self, id: EpicId) -> HierarchyRepositoryResult<()> {
        self.epics
            .remove(&id)
            .ok_or_else(|| HierarchyRepositoryError::not_found("epic", &id))?;
        let removed: Vec<FeatureId> = self
            .features
            .values()
            .filter(|feature| feature.epic_id() == id)
            .map(Feature::id)
            .collect();
        for feature_id in removed {
            self.delete_feature(feature_id)?;
        }
        Ok(())
    }
}
