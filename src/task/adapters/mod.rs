//! Persistence adapters for the work hierarchy.
//!
//! - [`memory::InMemoryHierarchyRepository`]: thread-safe in-memory storage
//! - [`postgres::PostgresHierarchyRepository`]: `PostgreSQL` persistence using
//!   Diesel

pub mod memory;
pub mod postgres;
