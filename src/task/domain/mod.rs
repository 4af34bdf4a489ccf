//! Domain model for the work hierarchy.
//!
//! Epics own features and features own tasks. Tasks carry a workflow status,
//! declared prerequisites and an optional sibling position; features and
//! epics carry cached progress. Infrastructure concerns stay outside this
//! boundary.

mod dependencies;
mod epic;
mod error;
mod feature;
mod history;
mod ids;
mod status;
mod task;

pub use dependencies::DependencyList;
pub use epic::{Epic, NewEpic, PersistedEpicData};
pub use error::{DependencyError, ParseContainerStatusError, TaskDomainError, TransitionError};
pub use feature::{Feature, NewFeature, PersistedFeatureData};
pub use history::{NewTaskHistory, TaskHistory};
pub use ids::{
    EpicId, EpicKey, ExecutionOrder, FeatureId, FeatureKey, HistoryId, Revision, TaskId, TaskKey,
};
pub use status::{ContainerStatus, TaskStatus};
pub use task::{NewTask, PersistedTaskData, Task};
