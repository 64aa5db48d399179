//! CompiledGraph struct and builder methods

use crate::graph::{Graph, NodeKey};
use crate::interrupt::InterruptConfig;
use crate::state::GraphState;
use crate::visualization::{visualize, VisualizationOptions};

/// Compiled graph ready for execution
///
/// Cheap to clone; step functions and routers are shared behind `Arc`.
pub struct CompiledGraph<K: NodeKey, S: GraphState> {
    pub(crate) graph: Graph<K, S>,
    pub(crate) interrupt_config: InterruptConfig<K>,
}

impl<K: NodeKey, S: GraphState> Clone for CompiledGraph<K, S> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            interrupt_config: self.interrupt_config.clone(),
        }
    }
}

impl<K: NodeKey, S: GraphState> std::fmt::Debug for CompiledGraph<K, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("graph", &self.graph)
            .field("interrupt_config", &self.interrupt_config)
            .finish()
    }
}

impl<K: NodeKey, S: GraphState> CompiledGraph<K, S> {
    pub(crate) fn new(graph: Graph<K, S>, interrupt_config: InterruptConfig<K>) -> Self {
        Self {
            graph,
            interrupt_config,
        }
    }

    /// Replace the interrupt configuration
    pub fn with_interrupt_config(mut self, interrupt_config: InterruptConfig<K>) -> Self {
        self.interrupt_config = interrupt_config;
        self
    }

    /// Underlying graph definition
    pub fn graph(&self) -> &Graph<K, S> {
        &self.graph
    }

    pub fn interrupt_config(&self) -> &InterruptConfig<K> {
        &self.interrupt_config
    }

    /// Visualize the graph structure
    ///
    /// ```rust,ignore
    /// let dot = compiled.visualize(&VisualizationOptions::dot());
    /// std::fs::write("workflow.dot", dot)?;
    /// ```
    pub fn visualize(&self, options: &VisualizationOptions) -> String {
        visualize(&self.graph, options)
    }

    /// Mermaid source for the graph
    pub fn draw_mermaid(&self) -> String {
        self.visualize(&VisualizationOptions::mermaid())
    }
}
