//! Identifier and validated scalar types for the work hierarchy.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage-assigned identifier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Wraps a storage-assigned identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the wrapped identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage-assigned identifier of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(i64);

impl FeatureId {
    /// Wraps a storage-assigned identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the wrapped identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage-assigned identifier of an epic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpicId(i64);

impl EpicId {
    /// Wraps a storage-assigned identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the wrapped identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EpicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage-assigned identifier of a task history row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(i64);

impl HistoryId {
    /// Wraps a storage-assigned identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the wrapped identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

/// Optimistic concurrency counter carried by every mutable row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(i64);

impl Revision {
    /// Revision assigned to freshly inserted rows.
    pub const INITIAL: Self = Self(1);

    /// Wraps a persisted revision.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the wrapped counter.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Returns the revision written by the next successful update.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_key(kind: &'static str, value: String) -> Result<String, TaskDomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(TaskDomainError::InvalidKey { kind, value });
    }
    Ok(trimmed.to_owned())
}

/// Unique human-readable task key, for example `E01-F02-003`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskKey(String);

impl TaskKey {
    /// Creates a validated task key.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidKey`] when the key is blank or
    /// contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        validate_key("task", value.into()).map(Self)
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskKey {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskKey> for String {
    fn from(key: TaskKey) -> Self {
        key.0
    }
}

impl AsRef<str> for TaskKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique human-readable feature key, for example `E01-F02`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureKey(String);

impl FeatureKey {
    /// Creates a validated feature key.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidKey`] when the key is blank or
    /// contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        validate_key("feature", value.into()).map(Self)
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FeatureKey {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeatureKey> for String {
    fn from(key: FeatureKey) -> Self {
        key.0
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique human-readable epic key, for example `E01`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EpicKey(String);

impl EpicKey {
    /// Creates a validated epic key.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidKey`] when the key is blank or
    /// contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        validate_key("epic", value.into()).map(Self)
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EpicKey {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EpicKey> for String {
    fn from(key: EpicKey) -> Self {
        key.0
    }
}

impl fmt::Display for EpicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an entity among its ordered siblings, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ExecutionOrder(u32);

impl ExecutionOrder {
    /// Creates a validated execution order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidExecutionOrder`] when the value is
    /// not a positive 32-bit integer.
    pub fn new(value: i64) -> Result<Self, TaskDomainError> {
        u32::try_from(value)
            .ok()
            .filter(|ordinal| *ordinal > 0)
            .map(Self)
            .ok_or(TaskDomainError::InvalidExecutionOrder(value))
    }

    /// Creates an execution order from a dense sequence position.
    ///
    /// Returns `None` for zero.
    #[must_use]
    pub const fn from_position(position: u32) -> Option<Self> {
        if position == 0 {
            None
        } else {
            Some(Self(position))
        }
    }

    /// Returns the ordinal.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for ExecutionOrder {
    type Error = TaskDomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExecutionOrder> for i64 {
    fn from(order: ExecutionOrder) -> Self {
        Self::from(order.0)
    }
}

impl fmt::Display for ExecutionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
