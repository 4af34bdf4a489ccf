//! `PostgreSQL` adapter for hierarchy persistence.
//!
//! Foreign keys cascade deletes from epics to features, tasks and history;
//! the schema ships as a Diesel migration under `migrations/`.

mod models;
mod repository;
mod schema;

pub use repository::{HierarchyPgPool, PostgresHierarchyRepository};
