//! CompiledGraph execution engine
//!
//! Once a [`StateGraph`](crate::StateGraph) is compiled it becomes a
//! [`CompiledGraph`] that can be executed any number of times with different
//! inputs.
//!
//! # Overview
//!
//! Execution is sequential: exactly one step or router runs at a time, and
//! each step gets an owned snapshot of the state. A run ends in one of three
//! ways:
//!
//! - **Completed** - a router returned END; the final state is returned
//! - **Suspended** - an interrupt point was reached; a [`Checkpoint`](crate::Checkpoint)
//!   holds the position and full state until [`CompiledGraph::resume`] is called
//! - **Failed** - a step returned an error, a router picked an undeclared
//!   destination, or the recursion limit was hit
//!
//! # Key Types
//!
//! - [`CompiledGraph`] - The executable graph
//! - [`RunConfig`] - Run id, tags, metadata and recursion limit for one invocation
//! - [`RunOutcome`] - Completed summary or suspended checkpoint
//! - [`RunSummary`] - Final state plus the ordered list of executed steps

mod execution;
mod graph;
mod types;

pub use graph::CompiledGraph;
pub use types::{RunConfig, RunOutcome, RunSummary};
