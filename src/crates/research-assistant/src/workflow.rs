//! Research workflow assembly and the review loop
//!
//! ```text
//! START -> generate_queries -> search_api -> evaluate_results
//!                  ^                ^              |
//!                  |                |    route_evaluation
//!                  |                |       /          \
//!                  |          refine_search       synthesize_report
//!                  |                                    |
//!                  |                              human_approval
//!                  |                                    |
//!                  +---------- route_human_feedback ----+--> END
//! ```
//!
//! With interactive approval the graph suspends after `human_approval`;
//! [`ResearchWorkflow::run`] asks an [`ApprovalPrompt`] for a decision and
//! resumes with it until the run reaches END.

use crate::config::AppConfig;
use crate::error::Result;
use crate::routers::{
    route_evaluation, route_human_feedback, EVALUATION_DESTINATIONS, FEEDBACK_DESTINATIONS,
    ROUTE_EVALUATION, ROUTE_HUMAN_FEEDBACK,
};
use crate::state::{ResearchState, ResearchUpdate, FEEDBACK_APPROVE, FEEDBACK_RETRY};
use crate::steps::{self, ResearchStep, StepContext};
use colored::Colorize;
use std::sync::Arc;
use stepgraph_core::{CompiledGraph, InterruptConfig, RunConfig, RunOutcome, RunSummary, StateGraph};

/// The compiled research workflow
pub type ResearchGraph = CompiledGraph<ResearchStep, ResearchState>;

/// Reviewer's verdict on a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Retry,
}

impl Decision {
    /// Feedback value written into the state on resume
    pub fn feedback(self) -> &'static str {
        match self {
            Decision::Approve => FEEDBACK_APPROVE,
            Decision::Retry => FEEDBACK_RETRY,
        }
    }
}

/// Source of review decisions for suspended runs
pub trait ApprovalPrompt {
    fn decide(&mut self, draft: &str) -> Result<Decision>;
}

impl<F> ApprovalPrompt for F
where
    F: FnMut(&str) -> Result<Decision>,
{
    fn decide(&mut self, draft: &str) -> Result<Decision> {
        self(draft)
    }
}

/// Build and compile the workflow for `ctx`
///
/// When `ctx` defers approval to a reviewer, the graph suspends after
/// `human_approval`; without that suspend point the step would leave the
/// feedback pending and the run would never reach END.
pub fn build_graph(ctx: Arc<StepContext>) -> stepgraph_core::Result<ResearchGraph> {
    let interrupts = if ctx.interactive_approval {
        InterruptConfig::new().with_interrupt_after(vec![ResearchStep::HumanApproval])
    } else {
        InterruptConfig::new()
    };
    register_steps(ctx).compile_with_interrupts(interrupts)
}

/// Register the six steps and their edges
fn register_steps(ctx: Arc<StepContext>) -> StateGraph<ResearchStep, ResearchState> {
    let mut graph: StateGraph<ResearchStep, ResearchState> = StateGraph::new();

    let c = Arc::clone(&ctx);
    graph.add_node(ResearchStep::GenerateQueries, move |s| steps::generate_queries(Arc::clone(&c), s));
    let c = Arc::clone(&ctx);
    graph.add_node(ResearchStep::SearchApi, move |s| steps::search_api(Arc::clone(&c), s));
    let c = Arc::clone(&ctx);
    graph.add_node(ResearchStep::EvaluateResults, move |s| steps::evaluate_results(Arc::clone(&c), s));
    let c = Arc::clone(&ctx);
    graph.add_node(ResearchStep::RefineSearch, move |s| steps::refine_search(Arc::clone(&c), s));
    let c = Arc::clone(&ctx);
    graph.add_node(ResearchStep::SynthesizeReport, move |s| steps::synthesize_report(Arc::clone(&c), s));
    let c = ctx;
    graph.add_node(ResearchStep::HumanApproval, move |s| steps::human_approval(Arc::clone(&c), s));

    graph
        .set_entry(ResearchStep::GenerateQueries)
        .add_edge(ResearchStep::GenerateQueries, ResearchStep::SearchApi)
        .add_edge(ResearchStep::SearchApi, ResearchStep::EvaluateResults)
        .add_conditional_edge(
            ResearchStep::EvaluateResults,
            ROUTE_EVALUATION,
            route_evaluation,
            EVALUATION_DESTINATIONS,
        )
        .add_edge(ResearchStep::RefineSearch, ResearchStep::SearchApi)
        .add_edge(ResearchStep::SynthesizeReport, ResearchStep::HumanApproval)
        .add_conditional_edge(
            ResearchStep::HumanApproval,
            ROUTE_HUMAN_FEEDBACK,
            route_human_feedback,
            FEEDBACK_DESTINATIONS,
        );

    graph
}

/// Engine options for a run: tags and the transition guard
pub fn run_config(config: &AppConfig) -> RunConfig {
    let run_config = RunConfig::new()
        .with_tags(config.tags.iter().cloned())
        .with_metadata("topic", serde_json::Value::String(config.topic.clone()));

    match config.recursion_limit() {
        Some(limit) => run_config.with_recursion_limit(limit),
        None => run_config,
    }
}

/// Compiled workflow plus the context its steps share
pub struct ResearchWorkflow {
    ctx: Arc<StepContext>,
    graph: ResearchGraph,
}

impl ResearchWorkflow {
    /// Build and compile the workflow
    ///
    /// Interactive contexts get a suspend point after `human_approval`.
    pub fn new(ctx: StepContext) -> Result<Self> {
        let ctx = Arc::new(ctx);
        let graph = build_graph(Arc::clone(&ctx))?;

        Ok(Self { ctx, graph })
    }

    pub fn graph(&self) -> &ResearchGraph {
        &self.graph
    }

    /// Run from `initial` to END, consulting `prompt` at every review
    pub async fn run<P: ApprovalPrompt>(
        &self,
        initial: ResearchState,
        config: RunConfig,
        prompt: &mut P,
    ) -> Result<RunSummary<ResearchStep, ResearchState>> {
        let mut outcome = self.graph.invoke_with_config(initial, config.clone()).await?;

        loop {
            let checkpoint = match outcome {
                RunOutcome::Completed(summary) => {
                    tracing::info!(
                        run_id = %summary.run_id,
                        steps = summary.steps,
                        iterations = summary.state.iteration_count,
                        "Research run completed"
                    );
                    return Ok(summary);
                }
                RunOutcome::Suspended(checkpoint) => checkpoint,
            };

            tracing::info!(
                checkpoint = %checkpoint.id,
                node = %checkpoint.node,
                step = checkpoint.step,
                "Waiting for review"
            );
            if tracing::enabled!(tracing::Level::DEBUG) {
                let json = checkpoint.to_json()?;
                tracing::debug!(checkpoint = %json, "Suspended run");
            }
            let decision = prompt.decide(&checkpoint.state.report_draft)?;
            self.narrate_decision(decision);

            outcome = self
                .graph
                .resume(
                    checkpoint,
                    Some(ResearchUpdate::feedback(decision.feedback())),
                    config.clone(),
                )
                .await?;
        }
    }

    fn narrate_decision(&self, decision: Decision) {
        tracing::debug!(?decision, "Review decision");
        if !self.ctx.narrate {
            return;
        }
        match decision {
            Decision::Approve => println!("\n   >>> {}\n", "User APPROVED the report.".green()),
            Decision::Retry => println!(
                "\n   >>> {}\n",
                "Feedback negative. Restarting research from scratch.".yellow()
            ),
        }
    }
}
