//! Task dependency graph and dependency validation.
//!
//! An edge `A -> B` means task `A` depends on task `B`. The graph is rebuilt
//! from storage for every validated operation; nothing is cached between
//! calls.

use crate::task::domain::{DependencyError, DependencyList, Task, TaskKey};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

/// Adjacency view over the dependencies of a task population.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    prerequisites: BTreeMap<TaskKey, Vec<TaskKey>>,
    dependents: BTreeMap<TaskKey, Vec<TaskKey>>,
}

impl DependencyGraph {
    /// Builds the graph from every task's declared dependencies.
    #[must_use]
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut graph = Self::default();
        for task in tasks {
            graph.set_dependencies(task.key(), task.depends_on());
        }
        graph
    }

    /// Replaces the outgoing edges of `task`.
    pub fn set_dependencies(&mut self, task: &TaskKey, depends_on: &DependencyList) {
        if let Some(previous) = self.prerequisites.remove(task) {
            for prerequisite in previous {
                if let Some(list) = self.dependents.get_mut(&prerequisite) {
                    list.retain(|dependent| dependent != task);
                }
            }
        }
        for prerequisite in depends_on {
            self.dependents
                .entry(prerequisite.clone())
                .or_default()
                .push(task.clone());
        }
        self.prerequisites
            .insert(task.clone(), depends_on.iter().cloned().collect());
    }

    /// Returns `true` when the task is part of the population.
    #[must_use]
    pub fn contains(&self, task: &TaskKey) -> bool {
        self.prerequisites.contains_key(task)
    }

    /// Returns the direct prerequisites of `task`.
    #[must_use]
    pub fn prerequisites_of(&self, task: &TaskKey) -> &[TaskKey] {
        self.prerequisites.get(task).map_or(&[], Vec::as_slice)
    }

    /// Returns the tasks that directly depend on `task`.
    #[must_use]
    pub fn dependents_of(&self, task: &TaskKey) -> &[TaskKey] {
        self.dependents.get(task).map_or(&[], Vec::as_slice)
    }

    /// Returns every transitive prerequisite of `task` in breadth-first
    /// order, excluding `task` itself.
    #[must_use]
    pub fn dependency_chain(&self, task: &TaskKey) -> Vec<TaskKey> {
        walk(task, |key| self.prerequisites_of(key))
    }

    /// Returns every transitive dependent of `task` in breadth-first order,
    /// excluding `task` itself. Each dependent appears once even when it is
    /// reachable along several paths.
    #[must_use]
    pub fn transitive_dependents(&self, task: &TaskKey) -> Vec<TaskKey> {
        walk(task, |key| self.dependents_of(key))
    }

    /// Returns a cycle through `task`, if one exists.
    ///
    /// The path starts and ends with `task`, for example `[A, B, C, A]`.
    #[must_use]
    pub fn find_cycle(&self, task: &TaskKey) -> Option<Vec<TaskKey>> {
        let mut path = vec![task.clone()];
        let mut visited = BTreeSet::new();
        self.search(task, task, &mut visited, &mut path)
            .then_some(path)
    }

    fn search(
        &self,
        node: &TaskKey,
        target: &TaskKey,
        visited: &mut BTreeSet<TaskKey>,
        path: &mut Vec<TaskKey>,
    ) -> bool {
        for prerequisite in self.prerequisites_of(node) {
            path.push(prerequisite.clone());
            if prerequisite == target {
                return true;
            }
            if visited.insert(prerequisite.clone())
                && self.search(prerequisite, target, visited, path)
            {
                return true;
            }
            path.pop();
        }
        false
    }
}

fn walk<'g>(start: &TaskKey, next: impl Fn(&TaskKey) -> &'g [TaskKey]) -> Vec<TaskKey> {
    let mut visited: BTreeSet<&TaskKey> = BTreeSet::from([start]);
    let mut order = Vec::new();
    let mut queue: VecDeque<&TaskKey> = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        for neighbour in next(current) {
            if visited.insert(neighbour) {
                order.push(neighbour.clone());
                queue.push_back(neighbour);
            }
        }
    }
    order
}

/// Validates proposed dependency sets against a task population.
#[derive(Debug, Clone)]
pub struct DependencyValidator {
    graph: DependencyGraph,
}

impl DependencyValidator {
    /// Builds a validator over the current dependencies of `population`.
    #[must_use]
    pub fn new(population: &[Task]) -> Self {
        Self {
            graph: DependencyGraph::from_tasks(population),
        }
    }

    /// Returns the graph the validator checks against.
    #[must_use]
    pub const fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Validates `proposed` as the new dependency set of `task`.
    ///
    /// Checks run in order: self-reference, existence, then acyclicity of
    /// the whole graph with the task's edges replaced by `proposed`. Cycles
    /// of any length are detected.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError::SelfDependency`],
    /// [`DependencyError::DependencyNotFound`] or
    /// [`DependencyError::CircularDependency`].
    pub fn validate(&self, task: &TaskKey, proposed: &DependencyList) -> Result<(), DependencyError> {
        if proposed.contains(task) {
            return Err(DependencyError::SelfDependency { task: task.clone() });
        }

        if let Some(missing) = proposed.iter().find(|key| !self.graph.contains(key)) {
            return Err(DependencyError::DependencyNotFound {
                task: task.clone(),
                dependency: missing.clone(),
            });
        }

        let mut candidate = self.graph.clone();
        candidate.set_dependencies(task, proposed);
        if let Some(cycle) = candidate.find_cycle(task) {
            return Err(DependencyError::CircularDependency {
                task: task.clone(),
                cycle,
            });
        }

        debug!(task = %task, dependencies = proposed.len(), "dependency set accepted");
        Ok(())
    }
}
