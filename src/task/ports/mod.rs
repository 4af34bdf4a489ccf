//! Port contracts for hierarchy persistence.

mod repository;

pub use repository::{
    HierarchyRepository, HierarchyRepositoryError, HierarchyRepositoryResult,
    HierarchyTransaction,
};
