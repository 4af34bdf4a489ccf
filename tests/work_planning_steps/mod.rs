//! Step definitions for work planning scenarios.

pub mod then;
pub mod when;
pub mod world;
