//! Declared task prerequisites.

use super::{DependencyError, TaskKey};
use serde::{Deserialize, Serialize};

/// Ordered, duplicate-free list of prerequisite task keys.
///
/// Stored as a JSON array of keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyList(Vec<TaskKey>);

impl DependencyList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds a list from raw keys supplied for `task`.
    ///
    /// Later duplicates are dropped so each prerequisite appears once.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError::MalformedDependencies`] when any entry is
    /// blank or contains whitespace.
    pub fn from_raw<I, S>(task: &str, raw: I) -> Result<Self, DependencyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: Vec<TaskKey> = Vec::new();
        for (index, entry) in raw.into_iter().enumerate() {
            let key = TaskKey::new(entry).map_err(|err| DependencyError::MalformedDependencies {
                task: task.to_owned(),
                reason: format!("entry {index}: {err}"),
            })?;
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        Ok(Self(keys))
    }

    /// Parses the serialized JSON array form.
    ///
    /// Blank input is treated as an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError::MalformedDependencies`] when the input is
    /// not a JSON array of non-blank strings.
    pub fn parse_json(task: &str, raw: &str) -> Result<Self, DependencyError> {
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }
        let entries: Vec<String> =
            serde_json::from_str(raw).map_err(|err| DependencyError::MalformedDependencies {
                task: task.to_owned(),
                reason: err.to_string(),
            })?;
        Self::from_raw(task, entries)
    }

    /// Serializes the list as a JSON array.
    #[must_use]
    pub fn to_json(&self) -> String {
        let keys: Vec<&str> = self.0.iter().map(TaskKey::as_str).collect();
        serde_json::to_string(&keys).unwrap_or_else(|_| "[]".to_owned())
    }

    /// Returns `true` when the key is listed.
    #[must_use]
    pub fn contains(&self, key: &TaskKey) -> bool {
        self.0.contains(key)
    }

    /// Returns `true` when no prerequisites are listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of prerequisites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the prerequisites in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, TaskKey> {
        self.0.iter()
    }

    /// Returns the prerequisites as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[TaskKey] {
        &self.0
    }

    /// Returns a copy of the list without `key`.
    #[must_use]
    pub fn without(&self, key: &TaskKey) -> Self {
        Self(self.0.iter().filter(|dep| *dep != key).cloned().collect())
    }
}

impl<'a> IntoIterator for &'a DependencyList {
    type Item = &'a TaskKey;
    type IntoIter = std::slice::Iter<'a, TaskKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<TaskKey> for DependencyList {
    fn from_iter<I: IntoIterator<Item = TaskKey>>(iter: I) -> Self {
        let mut keys: Vec<TaskKey> = Vec::new();
        for key in iter {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        Self(keys)
    }
}
