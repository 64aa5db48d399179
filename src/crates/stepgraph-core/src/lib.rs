//! # stepgraph-core
//!
//! A small, typed graph execution engine: named steps connected by
//! unconditional and conditional edges, executed one at a time over an
//! immutable-per-transition state value until a router hands control to the
//! terminal marker.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │      (step functions, routers, state type, step enum)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 StateGraph<K, S> (builder)                  │
//! │   add_node / add_edge / add_conditional_edge / set_entry    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ compile() validates structure
//! ┌─────────────────────────────────────────────────────────────┐
//! │                CompiledGraph<K, S> (executor)               │
//! │   invoke / invoke_with_config / resume                      │
//! │                                                             │
//! │   step(S) ─► Update ─► S.merge(Update) ─► edge / router     │
//! │        ▲                                          │         │
//! │        └──────────── next step ◄──────────────────┘         │
//! │                                   END ─► RunOutcome          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Modules
//!
//! - [`graph`] - Step identifiers, edges, routers and structural validation
//! - [`builder`] - [`StateGraph`] builder API
//! - [`compiled`] - [`CompiledGraph`] executor, run configuration and outcomes
//! - [`state`] - [`GraphState`] merge semantics
//! - [`interrupt`] - Suspend points and serializable [`Checkpoint`]s
//! - [`visualization`] - DOT, Mermaid and ASCII rendering
//! - [`error`] - [`GraphError`] taxonomy
//!
//! ## Guarantees
//!
//! - A step's update is merged only if the step succeeds; on failure the
//!   caller gets [`GraphError::NodeExecution`] with the state the step saw.
//! - A router can only hand control to a destination it declared.
//! - A step has at most one outgoing edge declaration, checked at compile time.
//! - Termination is data-driven. Set
//!   [`RunConfig::recursion_limit`] to bound runs whose routers might never
//!   return END.

pub mod builder;
pub mod compiled;
pub mod error;
pub mod graph;
pub mod interrupt;
pub mod state;
pub mod visualization;

pub use builder::StateGraph;
pub use compiled::{CompiledGraph, RunConfig, RunOutcome, RunSummary};
pub use error::{BoxError, GraphError, Result};
pub use graph::{Edge, Graph, NodeKey, Router, Target, END, START};
pub use interrupt::{Checkpoint, InterruptConfig, InterruptWhen};
pub use state::{merge_objects, GraphState};
pub use visualization::{visualize, VisualizationFormat, VisualizationOptions};
