//! StateGraph builder API for constructing typed workflows
//!
//! [`StateGraph`] collects steps, edges and routers for a closed set of step
//! identifiers, then [`compile`](StateGraph::compile)s them into an
//! executable [`CompiledGraph`]. All structural checks happen at compile
//! time; a graph that compiles can only fail at run time through a step
//! error, a router returning an undeclared destination, or a configured
//! recursion limit.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  StateGraph<K, S> (Builder)                          │
//! │                                                      │
//! │  add_node(K, step)         K -> async fn(S) -> Update│
//! │  add_edge(K, K)            unconditional successor   │
//! │  add_conditional_edge(K, name, router, destinations) │
//! │  set_entry(K)                                        │
//! └──────────────────────────┬───────────────────────────┘
//!                            │ compile()
//!                            ▼
//! ┌──────────────────────────────────────────────────────┐
//! │  CompiledGraph<K, S> (Executable)                    │
//! │  • sequential single-path execution                  │
//! │  • immutable state snapshots                         │
//! │  • interrupt points with serializable checkpoints    │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use stepgraph_core::{BoxError, NodeKey, StateGraph, Target};
//! use serde_json::{json, Map, Value};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Step {
//!     Increment,
//! }
//!
//! impl NodeKey for Step {
//!     const ALL: &'static [Self] = &[Step::Increment];
//!
//!     fn as_str(&self) -> &'static str {
//!         "increment"
//!     }
//! }
//!
//! async fn increment(state: Value) -> Result<Map<String, Value>, BoxError> {
//!     let count = state["count"].as_i64().unwrap_or(0);
//!     let mut update = Map::new();
//!     update.insert("count".to_string(), json!(count + 1));
//!     Ok(update)
//! }
//!
//! # async fn example() -> Result<(), stepgraph_core::GraphError> {
//! let mut graph = StateGraph::<Step, Value>::new();
//! graph.add_node(Step::Increment, increment);
//! graph.add_conditional_edge(
//!     Step::Increment,
//!     "until_three",
//!     |state: &Value| {
//!         if state["count"].as_i64().unwrap_or(0) >= 3 {
//!             Target::End
//!         } else {
//!             Target::Node(Step::Increment)
//!         }
//!     },
//!     [Target::Node(Step::Increment), Target::End],
//! );
//! graph.set_entry(Step::Increment);
//!
//! let compiled = graph.compile()?;
//! let result = compiled.invoke(json!({"count": 0})).await?;
//! assert_eq!(result["count"], 3);
//! # Ok(())
//! # }
//! ```

use crate::compiled::CompiledGraph;
use crate::error::{BoxError, GraphError, Result};
use crate::graph::{Edge, Graph, NodeKey, Router, StepFuture, Target};
use crate::interrupt::InterruptConfig;
use crate::state::GraphState;
use std::future::Future;
use std::sync::Arc;

/// Builder for typed state graphs
pub struct StateGraph<K: NodeKey, S: GraphState> {
    graph: Graph<K, S>,
    duplicates: Vec<K>,
}

impl<K: NodeKey, S: GraphState> StateGraph<K, S> {
    /// Create a new empty builder
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            duplicates: Vec::new(),
        }
    }

    /// Register the step function for `key`
    ///
    /// The step receives an owned snapshot of the full state and returns a
    /// partial update. Registering the same key twice is reported by
    /// [`compile`](Self::compile).
    pub fn add_node<F, Fut>(&mut self, key: K, step: F) -> &mut Self
    where
        F: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<S::Update, BoxError>> + Send + 'static,
    {
        let executor = Arc::new(move |state: S| -> StepFuture<S::Update> { Box::pin(step(state)) });
        if self.graph.add_node(key, executor).is_some() {
            self.duplicates.push(key);
        }
        self
    }

    /// Add an unconditional edge
    pub fn add_edge(&mut self, from: K, to: K) -> &mut Self {
        self.graph.add_edge(from, Edge::Direct(to));
        self
    }

    /// Add a conditional edge
    ///
    /// `router` must return one of `destinations`; anything else fails the
    /// run with [`GraphError::InvalidRoute`].
    pub fn add_conditional_edge<R, I>(
        &mut self,
        from: K,
        name: impl Into<String>,
        router: R,
        destinations: I,
    ) -> &mut Self
    where
        R: Fn(&S) -> Target<K> + Send + Sync + 'static,
        I: IntoIterator<Item = Target<K>>,
    {
        self.graph.add_edge(
            from,
            Edge::Conditional(Router {
                name: name.into(),
                route: Arc::new(router),
                destinations: destinations.into_iter().collect(),
            }),
        );
        self
    }

    /// Set the entry step
    pub fn set_entry(&mut self, key: K) -> &mut Self {
        self.graph.set_entry(key);
        self
    }

    /// Compile the graph for execution
    ///
    /// # Errors
    ///
    /// [`GraphError::Validation`] if a step was registered twice or the
    /// structure is invalid (see [`Graph::validate`]).
    pub fn compile(self) -> Result<CompiledGraph<K, S>> {
        self.compile_with_interrupts(InterruptConfig::default())
    }

    /// Compile the graph with interrupt points
    pub fn compile_with_interrupts(self, interrupt_config: InterruptConfig<K>) -> Result<CompiledGraph<K, S>> {
        if let Some(key) = self.duplicates.first() {
            return Err(GraphError::Validation(format!(
                "Step '{}' was registered more than once",
                key.as_str()
            )));
        }

        self.graph.validate().map_err(GraphError::Validation)?;

        for key in self.graph.unreachable_nodes() {
            tracing::warn!(node = key.as_str(), "Step is unreachable from the entry point");
        }

        tracing::debug!(
            nodes = self.graph.nodes.len(),
            interrupt_before = ?self.interrupt_names(&interrupt_config.interrupt_before),
            interrupt_after = ?self.interrupt_names(&interrupt_config.interrupt_after),
            "Compiled graph"
        );

        Ok(CompiledGraph::new(self.graph, interrupt_config))
    }

    fn interrupt_names(&self, nodes: &[K]) -> Vec<&'static str> {
        nodes.iter().map(|key| key.as_str()).collect()
    }
}

impl<K: NodeKey, S: GraphState> Default for StateGraph<K, S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Node {
        First,
        Second,
    }

    impl NodeKey for Node {
        const ALL: &'static [Self] = &[Node::First, Node::Second];

        fn as_str(&self) -> &'static str {
            match self {
                Node::First => "first",
                Node::Second => "second",
            }
        }
    }

    async fn noop(_state: Value) -> std::result::Result<Map<String, Value>, BoxError> {
        Ok(Map::new())
    }

    fn builder() -> StateGraph<Node, Value> {
        let mut graph = StateGraph::new();
        graph
            .add_node(Node::First, noop)
            .add_node(Node::Second, noop)
            .add_edge(Node::First, Node::Second)
            .add_conditional_edge(Node::Second, "finish", |_: &Value| Target::End, [Target::End])
            .set_entry(Node::First);
        graph
    }

    #[tokio::test]
    async fn test_compile_valid_graph() {
        assert!(builder().compile().is_ok());
    }

    #[tokio::test]
    async fn test_compile_without_entry() {
        let mut graph = StateGraph::<Node, Value>::new();
        graph
            .add_node(Node::First, noop)
            .add_node(Node::Second, noop)
            .add_edge(Node::First, Node::Second)
            .add_conditional_edge(Node::Second, "finish", |_: &Value| Target::End, [Target::End]);

        let err = graph.compile().unwrap_err();
        assert!(matches!(err, GraphError::Validation(ref msg) if msg.contains("entry")));
    }

    #[tokio::test]
    async fn test_compile_rejects_duplicate_registration() {
        let mut graph = builder();
        graph.add_node(Node::First, noop);

        let err = graph.compile().unwrap_err();
        assert!(err.to_string().contains("registered more than once"));
    }

    #[tokio::test]
    async fn test_compile_rejects_missing_step() {
        let mut graph = StateGraph::<Node, Value>::new();
        graph
            .add_node(Node::First, noop)
            .add_conditional_edge(Node::First, "finish", |_: &Value| Target::End, [Target::End])
            .set_entry(Node::First);

        let err = graph.compile().unwrap_err();
        assert!(err.to_string().contains("'second' has no registered step function"));
    }

    #[tokio::test]
    async fn test_compile_rejects_mixed_edges() {
        let mut graph = builder();
        graph.add_conditional_edge(Node::First, "extra", |_: &Value| Target::End, [Target::End]);

        let err = graph.compile().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("mixes unconditional and conditional edges"));
    }
}
