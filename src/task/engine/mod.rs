//! Pure lifecycle engine.
//!
//! Every component here operates on values loaded from storage and returns
//! decisions; none of them performs I/O. Services apply the decisions inside
//! a repository transaction.

mod auto_block;
mod dependency_graph;
mod progress;
mod resequence;
mod transition;

pub use auto_block::{AutoBlockPropagator, BlockDirective, block_reason};
pub use dependency_graph::{DependencyGraph, DependencyValidator};
pub use progress::{EpicProgress, FeatureProgress, ProgressAggregator};
pub use resequence::{SequenceItem, resequence};
pub use transition::{TransitionDecision, TransitionRequest, TransitionValidator};
