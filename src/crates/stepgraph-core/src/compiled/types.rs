//! Run configuration and outcome types

use crate::graph::NodeKey;
use crate::interrupt::Checkpoint;
use std::collections::HashMap;
use uuid::Uuid;

/// Run-scoped options for a single invocation
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Run identifier; a fresh v4 UUID is generated when unset
    pub run_id: Option<Uuid>,

    /// Tags attached to the run's tracing span and checkpoints
    pub tags: Vec<String>,

    /// Free-form metadata logged at run start
    pub metadata: HashMap<String, serde_json::Value>,

    /// Maximum number of step executions; `None` means unbounded
    pub recursion_limit: Option<usize>,
}

impl RunConfig {
    /// Create an empty run configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed run identifier
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Replace the run tags
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Add a single tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Cap the number of step executions
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = Some(limit);
        self
    }
}

/// A run that reached the terminal marker
#[derive(Debug, Clone)]
pub struct RunSummary<K, S> {
    pub run_id: Uuid,
    /// Final state
    pub state: S,
    /// Executed steps, in order
    pub visited: Vec<K>,
    /// Number of step executions
    pub steps: usize,
}

/// Result of running a graph until it stops
#[derive(Debug, Clone)]
pub enum RunOutcome<K: NodeKey, S> {
    /// The run reached END
    Completed(RunSummary<K, S>),
    /// The run stopped at an interrupt point
    Suspended(Checkpoint<K, S>),
}

impl<K: NodeKey, S> RunOutcome<K, S> {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    /// State at the point the run stopped
    pub fn state(&self) -> &S {
        match self {
            RunOutcome::Completed(summary) => &summary.state,
            RunOutcome::Suspended(checkpoint) => &checkpoint.state,
        }
    }

    /// Steps executed so far
    pub fn visited(&self) -> &[K] {
        match self {
            RunOutcome::Completed(summary) => &summary.visited,
            RunOutcome::Suspended(checkpoint) => &checkpoint.visited,
        }
    }

    pub fn checkpoint(&self) -> Option<&Checkpoint<K, S>> {
        match self {
            RunOutcome::Suspended(checkpoint) => Some(checkpoint),
            RunOutcome::Completed(_) => None,
        }
    }

    pub fn into_checkpoint(self) -> Option<Checkpoint<K, S>> {
        match self {
            RunOutcome::Suspended(checkpoint) => Some(checkpoint),
            RunOutcome::Completed(_) => None,
        }
    }
}
