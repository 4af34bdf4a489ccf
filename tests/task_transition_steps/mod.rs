//! Step definitions for task transition scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
