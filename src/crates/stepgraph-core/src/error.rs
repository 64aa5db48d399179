//! Error types for graph construction and execution
//!
//! All errors implement `std::error::Error` via the `thiserror` crate.
//!
//! # Error Hierarchy
//!
//! ```text
//! GraphError
//! ├── Validation         - Graph structure rejected by compile()
//! ├── InvalidRoute       - Router picked a destination it never declared
//! ├── NodeExecution      - A step failed; carries the last good state
//! ├── RecursionLimit     - Configured transition ceiling exceeded
//! ├── Interrupted        - Run suspended at an interrupt point (invoke only)
//! └── Serialization      - State or checkpoint JSON errors
//! ```
//!
//! `Validation` and `InvalidRoute` are configuration errors: the graph itself
//! is wrong and no amount of retrying will help. See
//! [`GraphError::is_configuration`].
//!
//! # Matching Specific Errors
//!
//! ```rust
//! use stepgraph_core::GraphError;
//!
//! fn report(err: &GraphError) {
//!     match err {
//!         GraphError::NodeExecution { node, source, snapshot } => {
//!             eprintln!("Step '{}' failed: {}", node, source);
//!             eprintln!("State before the step: {}", snapshot);
//!         }
//!         GraphError::Interrupted { node, reason } => {
//!             println!("Waiting for input at '{}': {}", node, reason);
//!         }
//!         e if e.is_configuration() => eprintln!("Graph is misconfigured: {}", e),
//!         e => eprintln!("Other error: {}", e),
//!     }
//! }
//! ```

use thiserror::Error;

/// Boxed error returned by step functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while building or running a graph
#[derive(Error, Debug)]
pub enum GraphError {
    /// Graph structure is invalid
    #[error("Graph validation failed: {0}")]
    Validation(String),

    /// A router returned a target outside its declared destination set
    #[error("Router '{router}' on step '{node}' returned undeclared destination '{target}' (declared: {allowed})")]
    InvalidRoute {
        router: String,
        node: String,
        target: String,
        allowed: String,
    },

    /// A step function failed
    ///
    /// `snapshot` is the JSON form of the state the step received. The failed
    /// step's output is never merged.
    #[error("Node '{node}' execution failed: {source}")]
    NodeExecution {
        node: String,
        #[source]
        source: BoxError,
        snapshot: serde_json::Value,
    },

    /// The configured transition ceiling was reached
    #[error("Recursion limit of {limit} step executions reached before step '{node}'")]
    RecursionLimit { limit: usize, node: String },

    /// Execution suspended at an interrupt point
    #[error("Execution interrupted at node '{node}': {reason}")]
    Interrupted { node: String, reason: String },

    /// State or checkpoint serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

impl GraphError {
    /// Create a node execution error
    pub fn node_execution(
        node: impl Into<String>,
        source: impl Into<BoxError>,
        snapshot: serde_json::Value,
    ) -> Self {
        Self::NodeExecution {
            node: node.into(),
            source: source.into(),
            snapshot,
        }
    }

    /// Create an interrupted error
    pub fn interrupted(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Interrupted {
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by a malformed graph rather than by a run
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidRoute { .. })
    }

    /// The last good state attached to a step failure
    pub fn snapshot(&self) -> Option<&serde_json::Value> {
        match self {
            Self::NodeExecution { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }
}
