//! State containers threaded through a graph run
//!
//! A state value is never mutated in place. Each step returns a partial
//! update and the executor builds the next snapshot with
//! [`GraphState::merge`], leaving the previous snapshot untouched. This keeps
//! the state a caller observes unchanged when a step fails.
//!
//! Merging is a shallow overwrite by key: keys present in the update replace
//! the stored value wholesale (containers included), keys absent from the
//! update keep their previous value, and the last write wins.
//!
//! # Dynamic state
//!
//! `serde_json::Value` implements [`GraphState`] with a JSON object as its
//! update type:
//!
//! ```rust
//! use stepgraph_core::GraphState;
//! use serde_json::json;
//!
//! let state = json!({"a": 1});
//! let update = json!({"b": 2}).as_object().cloned().unwrap_or_default();
//!
//! let next = state.merge(update);
//! assert_eq!(next, json!({"a": 1, "b": 2}));
//! assert_eq!(state, json!({"a": 1}));
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A state value that can absorb partial updates
pub trait GraphState: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Partial update returned by a step
    type Update: Send + 'static;

    /// Produce the next snapshot by applying `update` on top of `self`
    fn merge(&self, update: Self::Update) -> Self;

    /// JSON form of the state, attached to step failures
    fn snapshot(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl GraphState for Value {
    type Update = Map<String, Value>;

    fn merge(&self, update: Self::Update) -> Self {
        merge_objects(self, &update)
    }

    fn snapshot(&self) -> Value {
        self.clone()
    }
}

/// Shallow-merge `right` into a copy of `left`
///
/// A non-object `left` is replaced by an object built from `right`.
pub fn merge_objects(left: &Value, right: &Map<String, Value>) -> Value {
    let mut merged = match left {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    for (key, value) in right {
        merged.insert(key.clone(), value.clone());
    }
    Value::Object(merged)
}
