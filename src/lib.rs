//! Atelier: task lifecycle and dependency engine.
//!
//! This crate tracks work items (epics, features and tasks) moving through a
//! configurable status workflow, with validated inter-task dependencies,
//! automatic blocking of downstream work when a prerequisite is reopened,
//! dense sibling ordering and bottom-up progress roll-ups.
//!
//! # Architecture
//!
//! Atelier follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, files)
//!
//! # Modules
//!
//! - [`workflow`]: Status workflow definitions and their loading
//! - [`task`]: The work hierarchy, its lifecycle engine and services

pub mod task;
pub mod workflow;
