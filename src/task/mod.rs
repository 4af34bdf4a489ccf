//! Work hierarchy management.
//!
//! Epics own features and features own tasks. Tasks move through a
//! configurable workflow, declare prerequisites on other tasks and may be
//! ordered among their siblings; features and epics cache progress rolled up
//! from their tasks. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - The pure lifecycle engine in [`engine`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod engine;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
