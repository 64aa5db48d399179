//! Graph Visualization - Multi-format graph rendering
//!
//! Renders a graph definition as text in three formats:
//! - **DOT/Graphviz** - feed to `dot -Tpng` for images
//! - **Mermaid** - embed in markdown or render with mermaid tooling
//! - **ASCII art** - quick console view for debugging
//!
//! Steps are listed in [`NodeKey::ALL`] order so output is deterministic.
//! Conditional edges are drawn dashed and labelled with the router name;
//! steps that own a router are drawn as diamonds in Mermaid.
//!
//! ```text
//!   DOT:      digraph G { "__start__" -> "fetch"; ... }
//!   Mermaid:  graph TD
//!                 __start__((START)) --> fetch
//!   ASCII:    START -> fetch
//!             [fetch]
//!               -> review
//! ```

use crate::graph::{Edge, Graph, NodeKey, Target, END, START};
use crate::state::GraphState;

/// Visualization format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizationFormat {
    /// DOT format for Graphviz
    Dot,
    /// Mermaid diagram format
    Mermaid,
    /// Simple ASCII art
    Ascii,
}

/// Visualization options
#[derive(Debug, Clone)]
pub struct VisualizationOptions {
    /// Output format
    pub format: VisualizationFormat,
    /// Graph title/label
    pub title: Option<String>,
}

impl Default for VisualizationOptions {
    fn default() -> Self {
        Self {
            format: VisualizationFormat::Dot,
            title: None,
        }
    }
}

impl VisualizationOptions {
    /// Create with DOT format
    pub fn dot() -> Self {
        Self {
            format: VisualizationFormat::Dot,
            ..Default::default()
        }
    }

    /// Create with Mermaid format
    pub fn mermaid() -> Self {
        Self {
            format: VisualizationFormat::Mermaid,
            ..Default::default()
        }
    }

    /// Create with ASCII format
    pub fn ascii() -> Self {
        Self {
            format: VisualizationFormat::Ascii,
            ..Default::default()
        }
    }

    /// Set title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Visualize a graph as a string
pub fn visualize<K: NodeKey, S: GraphState>(graph: &Graph<K, S>, options: &VisualizationOptions) -> String {
    match options.format {
        VisualizationFormat::Dot => visualize_dot(graph, options),
        VisualizationFormat::Mermaid => visualize_mermaid(graph, options),
        VisualizationFormat::Ascii => visualize_ascii(graph),
    }
}

/// Generate DOT format visualization
fn visualize_dot<K: NodeKey, S: GraphState>(graph: &Graph<K, S>, options: &VisualizationOptions) -> String {
    let mut output = String::new();

    output.push_str("digraph G {\n");
    output.push_str("    rankdir=TB;\n");
    output.push_str("    node [shape=box, style=rounded];\n");

    if let Some(title) = &options.title {
        output.push_str("    labelloc=\"t\";\n");
        output.push_str(&format!("    label=\"{}\";\n", escape_dot(title)));
    }

    output.push_str(&format!(
        "    \"{}\" [label=\"START\", shape=circle, style=filled, fillcolor=green];\n",
        START
    ));
    output.push_str(&format!(
        "    \"{}\" [label=\"END\", shape=circle, style=filled, fillcolor=red];\n",
        END
    ));

    for key in graph.node_keys() {
        let shape = if matches!(graph.edge(key), Some(Edge::Conditional(_))) {
            ", shape=diamond, style=filled, fillcolor=moccasin"
        } else {
            ""
        };
        output.push_str(&format!("    \"{}\" [label=\"{}\"{}];\n", key.as_str(), escape_dot(key.as_str()), shape));
    }

    if let Some(entry) = graph.entry() {
        output.push_str(&format!("    \"{}\" -> \"{}\";\n", START, entry.as_str()));
    }

    for key in graph.node_keys() {
        match graph.edge(key) {
            Some(Edge::Direct(to)) => {
                output.push_str(&format!("    \"{}\" -> \"{}\";\n", key.as_str(), to.as_str()));
            }
            Some(Edge::Conditional(router)) => {
                for target in &router.destinations {
                    output.push_str(&format!(
                        "    \"{}\" -> \"{}\" [label=\"{}\", style=dashed];\n",
                        key.as_str(),
                        target.name(),
                        escape_dot(&router.name)
                    ));
                }
            }
            None => {}
        }
    }

    output.push_str("}\n");
    output
}

/// Generate Mermaid format visualization
fn visualize_mermaid<K: NodeKey, S: GraphState>(graph: &Graph<K, S>, options: &VisualizationOptions) -> String {
    let mut output = String::new();

    if let Some(title) = &options.title {
        output.push_str(&format!("---\ntitle: {}\n---\n", escape_mermaid(title)));
    }
    output.push_str("graph TD\n");

    output.push_str(&format!("    {}((START))\n", sanitize_id(START)));
    output.push_str(&format!(
        "    style {} fill:#90EE90,stroke:#228B22,stroke-width:3px\n",
        sanitize_id(START)
    ));
    output.push_str(&format!("    {}((END))\n", sanitize_id(END)));
    output.push_str(&format!(
        "    style {} fill:#FFB6C1,stroke:#DC143C,stroke-width:3px\n",
        sanitize_id(END)
    ));

    for key in graph.node_keys() {
        let id = sanitize_id(key.as_str());
        let label = escape_mermaid(key.as_str());
        if matches!(graph.edge(key), Some(Edge::Conditional(_))) {
            output.push_str(&format!("    {}{{\"{}\"}}\n", id, label));
            output.push_str(&format!("    style {} fill:#FFE4B5,stroke:#FF8C00,stroke-width:2px\n", id));
        } else {
            output.push_str(&format!("    {}[\"{}\"]\n", id, label));
        }
    }

    if let Some(entry) = graph.entry() {
        output.push_str(&format!("    {} --> {}\n", sanitize_id(START), sanitize_id(entry.as_str())));
    }

    for key in graph.node_keys() {
        match graph.edge(key) {
            Some(Edge::Direct(to)) => {
                output.push_str(&format!(
                    "    {} --> {}\n",
                    sanitize_id(key.as_str()),
                    sanitize_id(to.as_str())
                ));
            }
            Some(Edge::Conditional(router)) => {
                for target in &router.destinations {
                    output.push_str(&format!(
                        "    {} -. \"{}\" .-> {}\n",
                        sanitize_id(key.as_str()),
                        escape_mermaid(&router.name),
                        sanitize_id(target.name())
                    ));
                }
            }
            None => {}
        }
    }

    output
}

/// Generate simple ASCII art visualization
fn visualize_ascii<K: NodeKey, S: GraphState>(graph: &Graph<K, S>) -> String {
    let mut output = String::new();

    output.push_str("Graph Structure:\n");
    output.push_str("================\n\n");

    if let Some(entry) = graph.entry() {
        output.push_str(&format!("START -> {}\n", entry.as_str()));
    }

    for key in graph.node_keys() {
        output.push_str(&format!("\n[{}]\n", key.as_str()));
        match graph.edge(key) {
            Some(Edge::Direct(to)) => {
                output.push_str(&format!("  -> {}\n", to.as_str()));
            }
            Some(Edge::Conditional(router)) => {
                output.push_str(&format!("  -> ({})\n", router.name));
                for target in &router.destinations {
                    let name = match target {
                        Target::Node(to) => to.as_str(),
                        Target::End => "END",
                    };
                    output.push_str(&format!("     -> {}\n", name));
                }
            }
            None => {}
        }
    }

    output.push_str("\nEND\n");
    output
}

/// Escape special characters for DOT format
fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Escape special characters for Mermaid format
fn escape_mermaid(s: &str) -> String {
    s.replace('"', "&quot;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Sanitize node IDs for Mermaid (alphanumeric + underscore)
fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
