//! In-memory adapter for tests and embedded use.

mod hierarchy;

pub use hierarchy::InMemoryHierarchyRepository;
