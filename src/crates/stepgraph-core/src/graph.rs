//! Core graph data structures
//!
//! A [`Graph`] is the validated definition the executor walks: a closed set of
//! step identifiers, the step function registered for each, and at most one
//! outgoing edge per step.
//!
//! ```text
//!   START ──► entry step
//!                │  Edge::Direct
//!                ▼
//!            next step ──► Router ──► { declared destinations, maybe END }
//! ```
//!
//! Step identifiers are a closed enum implementing [`NodeKey`], so the set of
//! steps is known at compile time and can be checked exhaustively when the
//! graph is compiled instead of looked up by arbitrary string at run time.
//!
//! # Defining step identifiers
//!
//! ```rust
//! use stepgraph_core::NodeKey;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Step {
//!     Fetch,
//!     Review,
//! }
//!
//! impl NodeKey for Step {
//!     const ALL: &'static [Self] = &[Step::Fetch, Step::Review];
//!
//!     fn as_str(&self) -> &'static str {
//!         match self {
//!             Step::Fetch => "fetch",
//!             Step::Review => "review",
//!         }
//!     }
//! }
//!
//! assert_eq!(Step::from_name("review"), Some(Step::Review));
//! ```

use crate::error::BoxError;
use crate::state::GraphState;
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Special node identifier for graph entry, used in diagrams
pub const START: &str = "__start__";

/// Special node identifier for graph exit
pub const END: &str = "__end__";

/// Identifier of a step in a graph
///
/// Implemented by a fieldless enum. `ALL` lists every variant and fixes the
/// order steps appear in diagrams; `as_str` is the stable name used in logs,
/// diagrams, errors and serialized checkpoints.
pub trait NodeKey: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every step identifier
    const ALL: &'static [Self];

    /// Stable step name
    fn as_str(&self) -> &'static str;

    /// Resolve a step name back to its identifier
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.as_str() == name)
    }
}

/// Where control goes after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target<K> {
    /// Continue with another step
    Node(K),
    /// Stop the run
    End,
}

impl<K: NodeKey> Target<K> {
    /// Step name, or [`END`] for the terminal marker
    pub fn name(&self) -> &'static str {
        match self {
            Target::Node(key) => key.as_str(),
            Target::End => END,
        }
    }
}

impl<K: NodeKey> From<K> for Target<K> {
    fn from(key: K) -> Self {
        Target::Node(key)
    }
}

impl<K: NodeKey> fmt::Display for Target<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Future returned by a step function
pub type StepFuture<U> = BoxFuture<'static, Result<U, BoxError>>;

/// Step function: owned state snapshot in, partial update out
pub type StepFn<S> = Arc<dyn Fn(S) -> StepFuture<<S as GraphState>::Update> + Send + Sync>;

/// Routing function: picks the next target from the current state
pub type RouterFn<K, S> = Arc<dyn Fn(&S) -> Target<K> + Send + Sync>;

/// A named decision point with its declared destination set
pub struct Router<K: NodeKey, S> {
    pub name: String,
    pub route: RouterFn<K, S>,
    pub destinations: Vec<Target<K>>,
}

impl<K: NodeKey, S> Router<K, S> {
    /// Whether `target` was declared for this router
    pub fn allows(&self, target: Target<K>) -> bool {
        self.destinations.contains(&target)
    }

    /// Declared destinations joined for error messages
    pub fn describe_destinations(&self) -> String {
        self.destinations
            .iter()
            .map(|target| target.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<K: NodeKey, S> Clone for Router<K, S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            route: Arc::clone(&self.route),
            destinations: self.destinations.clone(),
        }
    }
}

/// Outgoing edge of a step
pub enum Edge<K: NodeKey, S> {
    /// Always continue with the given step
    Direct(K),
    /// Ask a router for the next target
    Conditional(Router<K, S>),
}

impl<K: NodeKey, S> Clone for Edge<K, S> {
    fn clone(&self) -> Self {
        match self {
            Edge::Direct(to) => Edge::Direct(*to),
            Edge::Conditional(router) => Edge::Conditional(router.clone()),
        }
    }
}

impl<K: NodeKey, S> fmt::Debug for Edge<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Direct(to) => f.debug_tuple("Direct").field(to).finish(),
            Edge::Conditional(router) => f
                .debug_struct("Conditional")
                .field("router", &router.name)
                .field("route", &"<function>")
                .field("destinations", &router.destinations)
                .finish(),
        }
    }
}

/// Graph definition: registered steps, edges and entry point
pub struct Graph<K: NodeKey, S: GraphState> {
    pub(crate) nodes: HashMap<K, StepFn<S>>,
    pub(crate) edges: HashMap<K, Vec<Edge<K, S>>>,
    pub(crate) entry: Option<K>,
}

impl<K: NodeKey, S: GraphState> Clone for Graph<K, S> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            entry: self.entry,
        }
    }
}

impl<K: NodeKey, S: GraphState> fmt::Debug for Graph<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.node_keys().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .field("entry", &self.entry)
            .finish()
    }
}

impl<K: NodeKey, S: GraphState> Graph<K, S> {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
        }
    }

    /// Register a step function, returning the one it replaced
    pub fn add_node(&mut self, key: K, executor: StepFn<S>) -> Option<StepFn<S>> {
        self.nodes.insert(key, executor)
    }

    /// Add an edge from a step
    pub fn add_edge(&mut self, from: K, edge: Edge<K, S>) {
        self.edges.entry(from).or_insert_with(Vec::new).push(edge);
    }

    /// Set the entry step
    pub fn set_entry(&mut self, key: K) {
        self.entry = Some(key);
    }

    /// Entry step, if set
    pub fn entry(&self) -> Option<K> {
        self.entry
    }

    /// Registered step identifiers in declaration order
    pub fn node_keys(&self) -> impl Iterator<Item = K> + '_ {
        K::ALL.iter().copied().filter(|key| self.nodes.contains_key(key))
    }

    /// Whether a step function is registered for `key`
    pub fn contains(&self, key: K) -> bool {
        self.nodes.contains_key(&key)
    }

    /// The single outgoing edge of a step
    pub fn edge(&self, from: K) -> Option<&Edge<K, S>> {
        self.edges.get(&from).and_then(|edges| edges.first())
    }

    /// Every target a step can hand control to
    pub fn successors(&self, from: K) -> Vec<Target<K>> {
        self.edges
            .get(&from)
            .map(|edges| {
                edges
                    .iter()
                    .flat_map(|edge| match edge {
                        Edge::Direct(to) => vec![Target::Node(*to)],
                        Edge::Conditional(router) => router.destinations.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Steps reachable from the entry, and whether END is reachable
    pub fn reachability(&self) -> (HashSet<K>, bool) {
        let mut seen = HashSet::new();
        let mut reaches_end = false;
        let mut queue: VecDeque<K> = self.entry.into_iter().collect();

        while let Some(key) = queue.pop_front() {
            if !seen.insert(key) {
                continue;
            }
            for target in self.successors(key) {
                match target {
                    Target::Node(next) => queue.push_back(next),
                    Target::End => reaches_end = true,
                }
            }
        }

        (seen, reaches_end)
    }

    /// Registered steps the entry can never reach
    pub fn unreachable_nodes(&self) -> Vec<K> {
        let (reachable, _) = self.reachability();
        self.node_keys().filter(|key| !reachable.contains(key)).collect()
    }

    /// Validate the graph structure
    ///
    /// Checks, in order: entry point, closed step registry, edge sources and
    /// targets, one outgoing edge per step, non-empty destination sets, and a
    /// path from the entry to END.
    pub fn validate(&self) -> Result<(), String> {
        let entry = self.entry.ok_or_else(|| "No entry point set".to_string())?;
        if !self.contains(entry) {
            return Err(format!("Entry point '{}' does not exist", entry.as_str()));
        }

        if let Some(missing) = K::ALL.iter().find(|key| !self.contains(**key)) {
            return Err(format!(
                "Step '{}' has no registered step function",
                missing.as_str()
            ));
        }

        for key in K::ALL {
            let edges = match self.edges.get(key) {
                Some(edges) if !edges.is_empty() => edges,
                _ => {
                    return Err(format!("Step '{}' has no outgoing edge", key.as_str()));
                }
            };

            if edges.len() > 1 {
                let conditional = edges
                    .iter()
                    .filter(|edge| matches!(edge, Edge::Conditional(_)))
                    .count();
                return Err(if conditional > 0 && conditional < edges.len() {
                    format!(
                        "Step '{}' mixes unconditional and conditional edges",
                        key.as_str()
                    )
                } else {
                    format!(
                        "Step '{}' declares {} outgoing edges; only one is allowed",
                        key.as_str(),
                        edges.len()
                    )
                });
            }

            match &edges[0] {
                Edge::Direct(to) => {
                    if !self.contains(*to) {
                        return Err(format!(
                            "Edge target '{}' from '{}' does not exist",
                            to.as_str(),
                            key.as_str()
                        ));
                    }
                }
                Edge::Conditional(router) => {
                    if router.destinations.is_empty() {
                        return Err(format!(
                            "Router '{}' on step '{}' declares no destinations",
                            router.name,
                            key.as_str()
                        ));
                    }
                    for target in &router.destinations {
                        if let Target::Node(to) = target {
                            if !self.contains(*to) {
                                return Err(format!(
                                    "Branch target '{}' of router '{}' does not exist",
                                    to.as_str(),
                                    router.name
                                ));
                            }
                        }
                    }
                }
            }
        }

        let (_, reaches_end) = self.reachability();
        if !reaches_end {
            return Err(format!(
                "No path from entry '{}' to {}",
                entry.as_str(),
                END
            ));
        }

        Ok(())
    }
}

impl<K: NodeKey, S: GraphState> Default for Graph<K, S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Serde adapter storing a step identifier by name
pub mod node_name {
    use super::NodeKey;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<K: NodeKey, Ser: Serializer>(key: &K, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.serialize_str(key.as_str())
    }

    pub fn deserialize<'de, K: NodeKey, D: Deserializer<'de>>(deserializer: D) -> Result<K, D::Error> {
        let name = String::deserialize(deserializer)?;
        K::from_name(&name).ok_or_else(|| D::Error::custom(format!("unknown step '{}'", name)))
    }
}

/// Serde adapter storing a list of step identifiers by name
pub mod node_names {
    use super::NodeKey;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<K: NodeKey, Ser: Serializer>(keys: &Vec<K>, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.collect_seq(keys.iter().map(|key| key.as_str()))
    }

    pub fn deserialize<'de, K: NodeKey, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<K>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|name| {
                K::from_name(name).ok_or_else(|| D::Error::custom(format!("unknown step '{}'", name)))
            })
            .collect()
    }
}
