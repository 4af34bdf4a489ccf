//! Service entry points for task dependencies.

use super::{
    TaskLifecycleResult, TaskLifecycleService,
    support::require_task,
};
use crate::task::{
    domain::{DependencyError, DependencyList, Task, TaskKey},
    engine::{DependencyGraph, DependencyValidator},
    ports::{HierarchyRepository, HierarchyTransaction},
};
use mockable::Clock;
use tracing::info;

impl<R, C> TaskLifecycleService<R, C>
where
    R: HierarchyRepository,
    C: Clock + Send + Sync,
{
    /// Replaces a task's prerequisites.
    ///
    /// The proposed set is validated against the whole task population
    /// before anything is written; forcing never applies here.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Dependency`](super::TaskLifecycleError::Dependency)
    /// when an entry is malformed, names the task itself, names a missing
    /// task or closes a cycle.
    pub async fn update_dependencies(
        &self,
        task_key: &TaskKey,
        depends_on: Vec<String>,
    ) -> TaskLifecycleResult<Task> {
        let proposed = DependencyList::from_raw(task_key.as_str(), depends_on);
        self.replace_dependencies(task_key, proposed).await
    }

    /// Replaces a task's prerequisites from their serialized JSON form.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::update_dependencies`].
    pub async fn update_dependencies_json(
        &self,
        task_key: &TaskKey,
        raw: &str,
    ) -> TaskLifecycleResult<Task> {
        let proposed = DependencyList::parse_json(task_key.as_str(), raw);
        self.replace_dependencies(task_key, proposed).await
    }

    /// Returns every transitive prerequisite of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown task.
    pub async fn dependency_chain(&self, task_key: &TaskKey) -> TaskLifecycleResult<Vec<TaskKey>> {
        let key = task_key.clone();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Vec<TaskKey>> {
                    require_task(tx, &key)?;
                    let graph = DependencyGraph::from_tasks(&tx.all_tasks()?);
                    Ok(graph.dependency_chain(&key))
                },
            )
            .await
    }

    /// Returns the tasks that directly depend on a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::EntityNotFound`](super::TaskLifecycleError::EntityNotFound)
    /// for an unknown task.
    pub async fn dependents_of(&self, task_key: &TaskKey) -> TaskLifecycleResult<Vec<TaskKey>> {
        let key = task_key.clone();
        self.repository
            .transaction(
                move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Vec<TaskKey>> {
                    require_task(tx, &key)?;
                    let graph = DependencyGraph::from_tasks(&tx.all_tasks()?);
                    Ok(graph.dependents_of(&key).to_vec())
                },
            )
            .await
    }

    async fn replace_dependencies(
        &self,
        task_key: &TaskKey,
        proposed: Result<DependencyList, DependencyError>,
    ) -> TaskLifecycleResult<Task> {
        let depends_on = proposed?;
        let key = task_key.clone();
        let now = self.clock.utc();
        self.repository
            .transaction(move |tx: &mut dyn HierarchyTransaction| -> TaskLifecycleResult<Task> {
                let task = require_task(tx, &key)?;
                DependencyValidator::new(&tx.all_tasks()?).validate(&key, &depends_on)?;

                let count = depends_on.len();
                let mut updated = task;
                updated.replace_dependencies(depends_on, now);
                let stored = tx.update_task(&updated)?;
                info!(task = %key, dependencies = count, "dependencies updated");
                Ok(stored)
            })
            .await
    }
}
