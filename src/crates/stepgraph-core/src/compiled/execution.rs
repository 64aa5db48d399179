//! Graph execution: invoke, resume and the step loop
//!
//! The executor walks a single path through the graph:
//!
//! 1. run the current step on an owned snapshot of the state and merge its
//!    partial update into a new snapshot;
//! 2. follow the step's direct edge, or ask its router and check the answer
//!    against the router's declared destinations;
//! 3. stop at END, otherwise repeat with the next step.
//!
//! Interrupt points and the optional recursion limit are checked around
//! each step.

use super::graph::CompiledGraph;
use super::types::{RunConfig, RunOutcome, RunSummary};
use crate::error::{GraphError, Result};
use crate::graph::{Edge, NodeKey, Target};
use crate::interrupt::{Checkpoint, InterruptWhen};
use crate::state::GraphState;
use chrono::Utc;
use uuid::Uuid;

/// Where the loop resumes
#[derive(Debug, Clone, Copy)]
enum Cursor<K> {
    /// Run `node`; `resumed` skips its interrupt-before check
    Execute { node: K, resumed: bool },
    /// `node` already ran; follow its outgoing edge
    Route(K),
}

/// Mutable bookkeeping for one run
struct RunContext<K> {
    run_id: Uuid,
    tags: Vec<String>,
    recursion_limit: Option<usize>,
    step: usize,
    visited: Vec<K>,
}

impl<K: NodeKey, S: GraphState> CompiledGraph<K, S> {
    /// Run the graph to completion and return the final state
    ///
    /// Returns [`GraphError::Interrupted`] if the graph was compiled with
    /// interrupt points and the run reached one; use
    /// [`invoke_with_config`](Self::invoke_with_config) to get the checkpoint.
    ///
    /// ```rust,ignore
    /// let final_state = compiled.invoke(json!({"count": 0})).await?;
    /// ```
    pub async fn invoke(&self, input: S) -> Result<S> {
        match self.invoke_with_config(input, RunConfig::default()).await? {
            RunOutcome::Completed(summary) => Ok(summary.state),
            RunOutcome::Suspended(checkpoint) => Err(GraphError::interrupted(
                checkpoint.node.as_str(),
                checkpoint.reason(),
            )),
        }
    }

    /// Run the graph from its entry step with run-scoped options
    ///
    /// Returns [`RunOutcome::Completed`] when END is reached, or
    /// [`RunOutcome::Suspended`] with a checkpoint at an interrupt point.
    ///
    /// # Errors
    ///
    /// - [`GraphError::NodeExecution`] when a step fails; carries the state
    ///   the step received
    /// - [`GraphError::InvalidRoute`] when a router picks an undeclared
    ///   destination
    /// - [`GraphError::RecursionLimit`] when `config.recursion_limit` is hit
    #[tracing::instrument(
        skip(self, input, config),
        fields(node_count = self.graph.nodes.len(), run_id = tracing::field::Empty, tags = ?config.tags)
    )]
    pub async fn invoke_with_config(&self, input: S, config: RunConfig) -> Result<RunOutcome<K, S>> {
        let entry = self
            .graph
            .entry()
            .ok_or_else(|| GraphError::Validation("No entry point set".to_string()))?;

        let run_id = config.run_id.unwrap_or_else(Uuid::new_v4);
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        tracing::info!(
            entry = entry.as_str(),
            recursion_limit = ?config.recursion_limit,
            metadata = ?config.metadata,
            "Starting graph execution"
        );

        let ctx = RunContext {
            run_id,
            tags: config.tags,
            recursion_limit: config.recursion_limit,
            step: 0,
            visited: Vec::new(),
        };

        self.run(
            Cursor::Execute {
                node: entry,
                resumed: false,
            },
            input,
            ctx,
        )
        .await
    }

    /// Continue a suspended run
    ///
    /// `update` is merged into the checkpoint state before execution
    /// continues. A checkpoint taken before a step runs that step next
    /// without suspending there again; one taken after a step follows that
    /// step's outgoing edge. The step counter carries over, so a recursion
    /// limit applies across the whole run.
    #[tracing::instrument(
        skip(self, checkpoint, update, config),
        fields(run_id = %checkpoint.run_id, node = checkpoint.node.as_str(), when = %checkpoint.when)
    )]
    pub async fn resume(
        &self,
        checkpoint: Checkpoint<K, S>,
        update: Option<S::Update>,
        config: RunConfig,
    ) -> Result<RunOutcome<K, S>> {
        let node = checkpoint.node;
        if !self.graph.contains(node) {
            return Err(GraphError::Validation(format!(
                "Checkpoint refers to unknown step '{}'",
                node.as_str()
            )));
        }

        tracing::info!(step = checkpoint.step, "Resuming graph execution");

        let state = match update {
            Some(update) => checkpoint.state.merge(update),
            None => checkpoint.state,
        };
        let cursor = match checkpoint.when {
            InterruptWhen::Before => Cursor::Execute {
                node,
                resumed: true,
            },
            InterruptWhen::After => Cursor::Route(node),
        };
        let ctx = RunContext {
            run_id: config.run_id.unwrap_or(checkpoint.run_id),
            tags: if config.tags.is_empty() {
                checkpoint.tags
            } else {
                config.tags
            },
            recursion_limit: config.recursion_limit,
            step: checkpoint.step,
            visited: checkpoint.visited,
        };

        self.run(cursor, state, ctx).await
    }

    async fn run(&self, mut cursor: Cursor<K>, mut state: S, mut ctx: RunContext<K>) -> Result<RunOutcome<K, S>> {
        loop {
            match cursor {
                Cursor::Execute { node, resumed } => {
                    if !resumed && self.interrupt_config.should_interrupt_before(node) {
                        tracing::info!(node = node.as_str(), "Interrupting before step");
                        return Ok(RunOutcome::Suspended(self.checkpoint(
                            node,
                            InterruptWhen::Before,
                            state,
                            ctx,
                        )));
                    }

                    if let Some(limit) = ctx.recursion_limit {
                        if ctx.step >= limit {
                            tracing::error!(limit, node = node.as_str(), "Recursion limit reached");
                            return Err(GraphError::RecursionLimit {
                                limit,
                                node: node.as_str().to_string(),
                            });
                        }
                    }

                    state = self.execute_step(node, state, ctx.step).await?;
                    ctx.step += 1;
                    ctx.visited.push(node);

                    if self.interrupt_config.should_interrupt_after(node) {
                        tracing::info!(node = node.as_str(), "Interrupting after step");
                        return Ok(RunOutcome::Suspended(self.checkpoint(
                            node,
                            InterruptWhen::After,
                            state,
                            ctx,
                        )));
                    }

                    cursor = Cursor::Route(node);
                }
                Cursor::Route(node) => match self.next_target(node, &state)? {
                    Target::Node(next) => {
                        cursor = Cursor::Execute {
                            node: next,
                            resumed: false,
                        };
                    }
                    Target::End => {
                        tracing::info!(steps = ctx.step, "Graph execution completed successfully");
                        return Ok(RunOutcome::Completed(RunSummary {
                            run_id: ctx.run_id,
                            state,
                            visited: ctx.visited,
                            steps: ctx.step,
                        }));
                    }
                },
            }
        }
    }

    /// Run one step and merge its update, leaving `state` untouched on failure
    async fn execute_step(&self, node: K, state: S, step: usize) -> Result<S> {
        let executor = self.graph.nodes.get(&node).ok_or_else(|| {
            GraphError::Validation(format!("Step '{}' has no registered step function", node.as_str()))
        })?;

        tracing::debug!(node = node.as_str(), step, "Executing step");
        match executor(state.clone()).await {
            Ok(update) => Ok(state.merge(update)),
            Err(source) => {
                tracing::error!(node = node.as_str(), error = %source, "Step failed");
                Err(GraphError::node_execution(node.as_str(), source, state.snapshot()))
            }
        }
    }

    fn next_target(&self, node: K, state: &S) -> Result<Target<K>> {
        match self.graph.edge(node) {
            Some(Edge::Direct(to)) => Ok(Target::Node(*to)),
            Some(Edge::Conditional(router)) => {
                let target = (router.route)(state);
                if !router.allows(target) {
                    tracing::error!(
                        router = %router.name,
                        node = node.as_str(),
                        target = target.name(),
                        "Router returned undeclared destination"
                    );
                    return Err(GraphError::InvalidRoute {
                        router: router.name.clone(),
                        node: node.as_str().to_string(),
                        target: target.name().to_string(),
                        allowed: router.describe_destinations(),
                    });
                }
                tracing::debug!(router = %router.name, from = node.as_str(), to = target.name(), "Routed");
                Ok(target)
            }
            None => Err(GraphError::Validation(format!(
                "Step '{}' has no outgoing edge",
                node.as_str()
            ))),
        }
    }

    fn checkpoint(&self, node: K, when: InterruptWhen, state: S, ctx: RunContext<K>) -> Checkpoint<K, S> {
        Checkpoint {
            id: Uuid::new_v4(),
            run_id: ctx.run_id,
            node,
            when,
            step: ctx.step,
            visited: ctx.visited,
            state,
            tags: ctx.tags,
            created_at: Utc::now(),
        }
    }
}
