//! Research workflow state
//!
//! [`ResearchState`] is the full record threaded through every step.
//! Steps return a [`ResearchUpdate`] naming only the fields they overwrite;
//! list fields are replaced whole, never appended to.

use serde::{Deserialize, Serialize};
use stepgraph_core::GraphState;

/// Feedback value before anyone has reviewed the draft
pub const FEEDBACK_PENDING: &str = "pending";

/// Feedback value that ends the run
pub const FEEDBACK_APPROVE: &str = "approve";

/// Feedback value that restarts research; any non-approve value does the same
pub const FEEDBACK_RETRY: &str = "retry";

/// Default research topic
pub const DEFAULT_TOPIC: &str = "Impact of generative AI on higher education";

/// Full state of a research run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchState {
    pub topic: String,
    pub queries: Vec<String>,
    pub raw_results: Vec<String>,
    pub iteration_count: u32,
    pub is_sufficient: bool,
    pub report_draft: String,
    pub human_feedback: String,
}

impl ResearchState {
    /// Initial state for `topic`, every field populated
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            queries: Vec::new(),
            raw_results: Vec::new(),
            iteration_count: 0,
            is_sufficient: false,
            report_draft: String::new(),
            human_feedback: FEEDBACK_PENDING.to_string(),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.human_feedback == FEEDBACK_APPROVE
    }
}

impl Default for ResearchState {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC)
    }
}

/// Partial update returned by a step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_results: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_sufficient: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_draft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_feedback: Option<String>,
}

impl ResearchUpdate {
    /// Update carrying only a feedback value, used when resuming after review
    pub fn feedback(value: impl Into<String>) -> Self {
        Self {
            human_feedback: Some(value.into()),
            ..Default::default()
        }
    }

    /// True when the update overwrites nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl GraphState for ResearchState {
    type Update = ResearchUpdate;

    fn merge(&self, update: ResearchUpdate) -> Self {
        Self {
            topic: update.topic.unwrap_or_else(|| self.topic.clone()),
            queries: update.queries.unwrap_or_else(|| self.queries.clone()),
            raw_results: update.raw_results.unwrap_or_else(|| self.raw_results.clone()),
            iteration_count: update.iteration_count.unwrap_or(self.iteration_count),
            is_sufficient: update.is_sufficient.unwrap_or(self.is_sufficient),
            report_draft: update.report_draft.unwrap_or_else(|| self.report_draft.clone()),
            human_feedback: update.human_feedback.unwrap_or_else(|| self.human_feedback.clone()),
        }
    }
}
