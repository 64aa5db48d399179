//! Suspend points and serializable checkpoints
//!
//! An [`InterruptConfig`] names steps the executor should stop at, either
//! before the step runs or after it ran and before its outgoing edge is
//! followed. Reaching one returns a [`Checkpoint`] to the caller instead of
//! blocking: the current position and the full state, ready to be serialized,
//! inspected, and handed back to
//! [`CompiledGraph::resume`](crate::CompiledGraph::resume) together with any
//! input the pause was waiting for.
//!
//! ```text
//!   invoke_with_config ──► ... ──► human_approval ──► [interrupt_after]
//!                                                          │
//!                                          RunOutcome::Suspended(Checkpoint)
//!                                                          │
//!                 caller collects input, builds a partial update
//!                                                          │
//!   resume(checkpoint, Some(update)) ──► router ──► ... ──► END
//! ```

use crate::error::Result;
use crate::graph::{node_name, node_names, NodeKey};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Steps at which execution suspends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptConfig<K> {
    /// Steps to suspend at before they run
    pub interrupt_before: Vec<K>,

    /// Steps to suspend at after they run, before routing
    pub interrupt_after: Vec<K>,
}

impl<K> Default for InterruptConfig<K> {
    fn default() -> Self {
        Self {
            interrupt_before: Vec::new(),
            interrupt_after: Vec::new(),
        }
    }
}

impl<K: NodeKey> InterruptConfig<K> {
    /// Create an empty interrupt configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set steps to interrupt before
    pub fn with_interrupt_before(mut self, nodes: Vec<K>) -> Self {
        self.interrupt_before = nodes;
        self
    }

    /// Set steps to interrupt after
    pub fn with_interrupt_after(mut self, nodes: Vec<K>) -> Self {
        self.interrupt_after = nodes;
        self
    }

    /// Check if execution should suspend before `node`
    pub fn should_interrupt_before(&self, node: K) -> bool {
        self.interrupt_before.contains(&node)
    }

    /// Check if execution should suspend after `node`
    pub fn should_interrupt_after(&self, node: K) -> bool {
        self.interrupt_after.contains(&node)
    }

    /// True when no interrupt points are configured
    pub fn is_empty(&self) -> bool {
        self.interrupt_before.is_empty() && self.interrupt_after.is_empty()
    }
}

/// When the interrupt occurred relative to its step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterruptWhen {
    /// The step has not run yet
    Before,
    /// The step ran; its outgoing edge has not been followed
    After,
}

impl fmt::Display for InterruptWhen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterruptWhen::Before => write!(f, "before"),
            InterruptWhen::After => write!(f, "after"),
        }
    }
}

/// Position and state of a suspended run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint<K: NodeKey, S> {
    /// Unique ID for this checkpoint
    pub id: Uuid,

    /// Run this checkpoint belongs to
    pub run_id: Uuid,

    /// Step the run is suspended at
    #[serde(with = "node_name")]
    pub node: K,

    /// Whether `node` already ran
    pub when: InterruptWhen,

    /// Step executions completed so far
    pub step: usize,

    /// Steps executed so far, in order
    #[serde(with = "node_names")]
    pub visited: Vec<K>,

    /// Full state at the suspend point
    pub state: S,

    /// Run-scoped tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Timestamp when suspended
    pub created_at: DateTime<Utc>,
}

impl<K: NodeKey, S> Checkpoint<K, S> {
    /// Human-readable reason, used when `invoke` reports the suspension
    pub fn reason(&self) -> String {
        format!(
            "suspended {} step '{}' after {} step executions",
            self.when,
            self.node.as_str(),
            self.step
        )
    }
}

impl<K: NodeKey, S: Serialize + DeserializeOwned> Checkpoint<K, S> {
    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a checkpoint previously produced by [`Checkpoint::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Node {
        Draft,
        Approve,
    }

    impl NodeKey for Node {
        const ALL: &'static [Self] = &[Node::Draft, Node::Approve];

        fn as_str(&self) -> &'static str {
            match self {
                Node::Draft => "draft",
                Node::Approve => "approve",
            }
        }
    }

    #[test]
    fn test_interrupt_config_builders() {
        let config = InterruptConfig::new()
            .with_interrupt_before(vec![Node::Draft])
            .with_interrupt_after(vec![Node::Approve]);

        assert!(config.should_interrupt_before(Node::Draft));
        assert!(!config.should_interrupt_before(Node::Approve));
        assert!(config.should_interrupt_after(Node::Approve));
        assert!(!config.is_empty());
        assert!(InterruptConfig::<Node>::new().is_empty());
    }

    #[test]
    fn test_checkpoint_serializes_steps_by_name() {
        let checkpoint = Checkpoint {
            id: Uuid::new_v4(),
            run_id: Uuid::new_v4(),
            node: Node::Approve,
            when: InterruptWhen::After,
            step: 2,
            visited: vec![Node::Draft, Node::Approve],
            state: json!({"draft": "text"}),
            tags: vec!["review".to_string()],
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&checkpoint).unwrap();
        assert_eq!(value["node"], "approve");
        assert_eq!(value["when"], "after");
        assert_eq!(value["visited"], json!(["draft", "approve"]));

        let restored: Checkpoint<Node, serde_json::Value> =
            Checkpoint::from_json(&checkpoint.to_json().unwrap()).unwrap();
        assert_eq!(restored.node, Node::Approve);
        assert_eq!(restored.visited, checkpoint.visited);
        assert_eq!(restored.state, checkpoint.state);
    }

    #[test]
    fn test_unknown_step_name_rejected() {
        let json = json!({
            "id": Uuid::new_v4(),
            "run_id": Uuid::new_v4(),
            "node": "publish",
            "when": "before",
            "step": 0,
            "visited": [],
            "state": {},
            "created_at": Utc::now(),
        });

        let parsed = serde_json::from_value::<Checkpoint<Node, serde_json::Value>>(json);
        assert!(parsed.unwrap_err().to_string().contains("unknown step 'publish'"));
    }
}
