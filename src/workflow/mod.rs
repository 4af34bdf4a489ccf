//! Configurable status workflows.
//!
//! A workflow names the statuses a task may hold, which moves between them
//! are legal, and how statuses group into ordered phases. The module follows
//! hexagonal architecture:
//!
//! - Domain types and structural validation in [`domain`]
//! - The loading contract in [`ports`]
//! - JSON file and fixed-definition sources in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
