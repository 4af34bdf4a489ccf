//! Repository port for the epic, feature and task hierarchy.
//!
//! Every service operation runs inside one [`HierarchyRepository::transaction`]
//! call. The closure receives a [`HierarchyTransaction`] and either returns
//! `Ok`, committing every write it made, or `Err`, discarding all of them.

use crate::task::domain::{
    Epic, EpicId, EpicKey, Feature, FeatureId, FeatureKey, NewEpic, NewFeature, NewTask,
    NewTaskHistory, Task, TaskHistory, TaskId, TaskKey,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for hierarchy repository operations.
pub type HierarchyRepositoryResult<T> = Result<T, HierarchyRepositoryError>;

/// Hierarchy persistence contract.
#[async_trait]
pub trait HierarchyRepository: Send + Sync {
    /// Runs `work` inside a single transaction.
    ///
    /// The closure is synchronous and runs to completion once started, even
    /// if the returned future is dropped meanwhile. Adapters that run it off
    /// the awaiting task check for a dropped future after the closure returns
    /// and roll back instead of committing.
    ///
    /// # Errors
    ///
    /// Returns the closure's error after rolling back, or a
    /// [`HierarchyRepositoryError`] converted into `E` when the transaction
    /// cannot be opened or committed. A transaction rolled back because its
    /// future was dropped reports [`HierarchyRepositoryError::Abandoned`],
    /// though nobody is left to observe it.
    async fn transaction<F, T, E>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn HierarchyTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<HierarchyRepositoryError> + Send + 'static;
}

/// Reads and writes available inside a transaction.
///
/// Lookups return `Ok(None)` for missing rows. Updates compare the entity's
/// revision with the stored one and return the entity stamped with the new
/// revision.
pub trait HierarchyTransaction {
    /// Finds an epic by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::Persistence`] on storage failure.
    fn epic(&mut self, id: EpicId) -> HierarchyRepositoryResult<Option<Epic>>;

    /// Finds an epic by key.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::Persistence`] on storage failure.
    fn epic_by_key(&mut self, key: &EpicKey) -> HierarchyRepositoryResult<Option<Epic>>;

    /// Lists every epic ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::Persistence`] on storage failure.
    fn all_epics(&mut self) -> HierarchyRepositoryResult<Vec<Epic>>;

    /// Finds a feature by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::Persistence`] on storage failure.
    fn feature(&mut self, id: FeatureId) -> HierarchyRepositoryResult<Option<Feature>>;

    /// Finds a feature by key.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::Persistence`] on storage failure.
    fn feature_by_key(&mut self, key: &FeatureKey) -> HierarchyRepositoryResult<Option<Feature>>;

    /// Lists the features of an epic ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::Persistence`] on storage failure.
    fn features_in_epic(&mut self, epic_id: EpicId) -> HierarchyRepositoryResult<Vec<Feature>>;

    /// Finds a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::Persistence`] on storage failure.
    fn task(&mut self, id: TaskId) -> HierarchyRepositoryResult<Option<Task>>;

    /// Finds a task by key.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::Persistence`] on storage failure.
    fn task_by_key(&mut self, key: &TaskKey) -> HierarchyRepositoryResult<Option<Task>>;

    /// Lists the tasks of a feature ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::Persistence`] on storage failure.
    fn tasks_in_feature(&mut self, feature_id: FeatureId) -> HierarchyRepositoryResult<Vec<Task>>;

    /// Lists every task ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::Persistence`] on storage failure.
    fn all_tasks(&mut self) -> HierarchyRepositoryResult<Vec<Task>>;

    /// Lists a task's history oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::Persistence`] on storage failure.
    fn history_for_task(&mut self, task_id: TaskId) -> HierarchyRepositoryResult<Vec<TaskHistory>>;

    /// Stores a new epic.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::DuplicateKey`] when the key is
    /// taken.
    fn insert_epic(&mut self, epic: NewEpic) -> HierarchyRepositoryResult<Epic>;

    /// Stores a new feature.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::DuplicateKey`] when the key is
    /// taken or [`HierarchyRepositoryError::NotFound`] when the epic does
    /// not exist.
    fn insert_feature(&mut self, feature: NewFeature) -> HierarchyRepositoryResult<Feature>;

    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::DuplicateKey`] when the key is
    /// taken or [`HierarchyRepositoryError::NotFound`] when the feature does
    /// not exist.
    fn insert_task(&mut self, task: NewTask) -> HierarchyRepositoryResult<Task>;

    /// Persists changes to an epic.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::NotFound`] or
    /// [`HierarchyRepositoryError::ConcurrentModification`].
    fn update_epic(&mut self, epic: &Epic) -> HierarchyRepositoryResult<Epic>;

    /// Persists changes to a feature.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::NotFound`] or
    /// [`HierarchyRepositoryError::ConcurrentModification`].
    fn update_feature(&mut self, feature: &Feature) -> HierarchyRepositoryResult<Feature>;

    /// Persists changes to a task.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::NotFound`] or
    /// [`HierarchyRepositoryError::ConcurrentModification`].
    fn update_task(&mut self, task: &Task) -> HierarchyRepositoryResult<Task>;

    /// Appends a history row.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::NotFound`] when the task does not
    /// exist.
    fn append_history(&mut self, entry: NewTaskHistory) -> HierarchyRepositoryResult<TaskHistory>;

    /// Deletes a task and its history.
    ///
    /// Other tasks' dependency lists are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::NotFound`] when the task does not
    /// exist.
    fn delete_task(&mut self, id: TaskId) -> HierarchyRepositoryResult<()>;

    /// Deletes a feature, its tasks and their history.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::NotFound`] when the feature does
    /// not exist.
    fn delete_feature(&mut self, id: FeatureId) -> HierarchyRepositoryResult<()>;

    /// Deletes an epic and everything below it.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyRepositoryError::NotFound`] when the epic does not
    /// exist.
    fn delete_epic(&mut self, id: EpicId) -> HierarchyRepositoryResult<()>;
}

/// Errors returned by hierarchy repository implementations.
#[derive(Debug, Clone, Error)]
pub enum HierarchyRepositoryError {
    /// The row does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Identifier or key that was looked up.
        key: String,
    },

    /// The stored revision differs from the one the caller read.
    #[error("{entity} {key} was modified concurrently")]
    ConcurrentModification {
        /// Entity kind.
        entity: &'static str,
        /// Key of the modified row.
        key: String,
    },

    /// Another row already uses the key.
    #[error("duplicate {entity} key: {key}")]
    DuplicateKey {
        /// Entity kind.
        entity: &'static str,
        /// Rejected key.
        key: String,
    },

    /// The caller stopped waiting, so the writes were rolled back.
    #[error("transaction abandoned before commit")]
    Abandoned,

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl HierarchyRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, key: &dyn std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}
