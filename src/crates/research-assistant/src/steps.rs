//! Mock research steps
//!
//! Each step paces itself with the simulated load bar, narrates what it is
//! doing, and returns a partial [`ResearchUpdate`]. Search results and
//! evaluation are hardcoded stand-ins for real backends.

use crate::error::StepError;
use crate::progress::Pacer;
use crate::state::{ResearchState, ResearchUpdate, FEEDBACK_APPROVE, FEEDBACK_PENDING};
use colored::Colorize;
use std::fmt;
use std::sync::Arc;
use stepgraph_core::{BoxError, NodeKey};

/// Results returned by the first, unrefined search
pub const INITIAL_RESULTS: [&str; 2] = ["Paper A (very old)", "Paper B (barely relevant)"];

/// Results returned once the queries have been refined
pub const REFINED_RESULTS: [&str; 4] = [
    "Paper A",
    "Paper B",
    "Paper C (relevant, 2024)",
    "Paper D (seminal survey)",
];

/// Minimum number of results considered sufficient
pub const SUFFICIENT_RESULTS: usize = 3;

/// Suffix appended to every query by the refine step
pub const REFINE_SUFFIX: &str = " review";

/// Steps of the research workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResearchStep {
    GenerateQueries,
    SearchApi,
    EvaluateResults,
    RefineSearch,
    SynthesizeReport,
    HumanApproval,
}

impl NodeKey for ResearchStep {
    const ALL: &'static [Self] = &[
        ResearchStep::GenerateQueries,
        ResearchStep::SearchApi,
        ResearchStep::EvaluateResults,
        ResearchStep::RefineSearch,
        ResearchStep::SynthesizeReport,
        ResearchStep::HumanApproval,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            ResearchStep::GenerateQueries => "generate_queries",
            ResearchStep::SearchApi => "search_api",
            ResearchStep::EvaluateResults => "evaluate_results",
            ResearchStep::RefineSearch => "refine_search",
            ResearchStep::SynthesizeReport => "synthesize_report",
            ResearchStep::HumanApproval => "human_approval",
        }
    }
}

impl fmt::Display for ResearchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared collaborators for the steps
#[derive(Debug, Clone)]
pub struct StepContext {
    pub pacer: Pacer,
    /// Leave the approval decision to a suspend point instead of auto-approving
    pub interactive_approval: bool,
    /// Print the step narrative to stdout
    pub narrate: bool,
}

impl StepContext {
    pub fn new(pacer: Pacer, interactive_approval: bool) -> Self {
        Self {
            pacer,
            interactive_approval,
            narrate: true,
        }
    }

    /// No pacing, no narration, auto-approval
    pub fn quiet() -> Self {
        Self {
            pacer: Pacer::disabled(),
            interactive_approval: false,
            narrate: false,
        }
    }

    pub fn with_interactive_approval(mut self, interactive: bool) -> Self {
        self.interactive_approval = interactive;
        self
    }

    fn banner(&self, step: ResearchStep) {
        if self.narrate {
            println!("\n\n{}\n", format!("===== [{}] =====", step).bold().blue());
        }
    }

    fn say(&self, line: impl AsRef<str>) {
        if self.narrate {
            println!("{}", line.as_ref());
        }
    }
}

/// Produce the initial queries for the topic and reset the iteration counter
pub async fn generate_queries(ctx: Arc<StepContext>, state: ResearchState) -> Result<ResearchUpdate, BoxError> {
    ctx.pacer.simulate_load(3.0, "Starting reasoning engine").await;
    ctx.banner(ResearchStep::GenerateQueries);

    let topic = state.topic.as_str();
    if topic.trim().is_empty() {
        return Err(StepError::EmptyTopic.into());
    }
    ctx.say(format!("   - Research topic: '{}'", topic));

    let queries = vec![
        format!("principles {}", topic),
        format!("recent advances {}", topic),
        format!("{} methodology", topic),
    ];
    ctx.say(format!("   - Generated queries: {:?}", queries));
    tracing::debug!(count = queries.len(), "Generated queries");

    Ok(ResearchUpdate {
        queries: Some(queries),
        iteration_count: Some(0),
        human_feedback: Some(FEEDBACK_PENDING.to_string()),
        ..Default::default()
    })
}

/// Run the queries against the mock academic API
///
/// The first pass (`iteration_count == 0`) finds too little; any later pass
/// finds enough.
pub async fn search_api(ctx: Arc<StepContext>, state: ResearchState) -> Result<ResearchUpdate, BoxError> {
    ctx.pacer.simulate_load(3.0, "Querying external databases").await;
    ctx.banner(ResearchStep::SearchApi);

    if state.queries.is_empty() {
        return Err(StepError::NoQueries.into());
    }
    ctx.say(format!("   - Running queries: {:?}", state.queries));

    let results: Vec<String> = if state.iteration_count == 0 {
        INITIAL_RESULTS.iter().map(|r| r.to_string()).collect()
    } else {
        REFINED_RESULTS.iter().map(|r| r.to_string()).collect()
    };
    ctx.say(format!("   - Results found: {} documents.", results.len()));
    tracing::debug!(iteration = state.iteration_count, results = results.len(), "Search completed");

    Ok(ResearchUpdate {
        raw_results: Some(results),
        ..Default::default()
    })
}

/// Decide whether the results are sufficient and count the iteration
pub async fn evaluate_results(ctx: Arc<StepContext>, state: ResearchState) -> Result<ResearchUpdate, BoxError> {
    ctx.pacer.simulate_load(2.0, "Analyzing relevance").await;
    ctx.banner(ResearchStep::EvaluateResults);

    let iteration_count = state
        .iteration_count
        .checked_add(1)
        .ok_or(StepError::CounterOverflow)?;
    let is_sufficient = state.raw_results.len() >= SUFFICIENT_RESULTS;
    if is_sufficient {
        ctx.say("   - Evaluation: SUFFICIENT. Proceeding to synthesis.");
    } else {
        ctx.say("   - Evaluation: INSUFFICIENT. Refinement required.");
    }

    Ok(ResearchUpdate {
        is_sufficient: Some(is_sufficient),
        iteration_count: Some(iteration_count),
        ..Default::default()
    })
}

/// Make every query more specific
pub async fn refine_search(ctx: Arc<StepContext>, state: ResearchState) -> Result<ResearchUpdate, BoxError> {
    ctx.pacer.simulate_load(2.0, "Adjusting search parameters").await;
    ctx.banner(ResearchStep::RefineSearch);

    if state.queries.is_empty() {
        return Err(StepError::NoQueries.into());
    }
    let queries: Vec<String> = state
        .queries
        .iter()
        .map(|query| format!("{}{}", query, REFINE_SUFFIX))
        .collect();
    ctx.say(format!("   - New queries generated: {}", queries.len()));

    Ok(ResearchUpdate {
        queries: Some(queries),
        ..Default::default()
    })
}

/// Draft the report from the collected results
pub async fn synthesize_report(ctx: Arc<StepContext>, state: ResearchState) -> Result<ResearchUpdate, BoxError> {
    ctx.pacer.simulate_load(4.0, "Drafting final report").await;
    ctx.banner(ResearchStep::SynthesizeReport);

    if state.raw_results.is_empty() {
        return Err(StepError::NoResults.into());
    }
    let draft = format!(
        "REPORT ON {}\nBased on {} key papers, the field shows...",
        state.topic.to_uppercase(),
        state.raw_results.len()
    );
    ctx.say("   - Report draft generated.");

    Ok(ResearchUpdate {
        report_draft: Some(draft),
        ..Default::default()
    })
}

/// Present the draft for review
///
/// Without interactive approval the review is simulated and always
/// approves. With it, the step only presents the draft; the caller suspends
/// after this step and supplies the feedback when resuming.
pub async fn human_approval(ctx: Arc<StepContext>, state: ResearchState) -> Result<ResearchUpdate, BoxError> {
    ctx.pacer.simulate_load(1.0, "Preparing review interface").await;
    ctx.banner(ResearchStep::HumanApproval);
    ctx.say(format!(
        "   - Showing draft to the user for review:\n\n{}\n",
        state.report_draft
    ));

    if ctx.interactive_approval {
        return Ok(ResearchUpdate::default());
    }

    ctx.pacer.simulate_load(2.0, "Waiting for user input").await;
    ctx.say(format!("\n   >>> {}\n", "[Simulation] User reviewing... APPROVED.".green()));

    Ok(ResearchUpdate::feedback(FEEDBACK_APPROVE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Arc<StepContext> {
        Arc::new(StepContext::quiet())
    }

    #[test]
    fn test_step_names_round_trip() {
        for step in ResearchStep::ALL {
            assert_eq!(ResearchStep::from_name(step.as_str()), Some(*step));
        }
        assert_eq!(ResearchStep::HumanApproval.to_string(), "human_approval");
    }

    #[tokio::test]
    async fn test_generate_queries() {
        let state = ResearchState {
            iteration_count: 4,
            human_feedback: "retry".to_string(),
            ..ResearchState::new("rust")
        };
        let update = generate_queries(ctx(), state).await.unwrap();

        assert_eq!(
            update.queries,
            Some(vec![
                "principles rust".to_string(),
                "recent advances rust".to_string(),
                "rust methodology".to_string(),
            ])
        );
        assert_eq!(update.iteration_count, Some(0));
        assert_eq!(update.human_feedback.as_deref(), Some(FEEDBACK_PENDING));
        assert!(update.raw_results.is_none());
    }

    #[tokio::test]
    async fn test_generate_queries_rejects_blank_topic() {
        let err = generate_queries(ctx(), ResearchState::new("  ")).await.unwrap_err();
        assert_eq!(err.to_string(), StepError::EmptyTopic.to_string());
    }

    #[tokio::test]
    async fn test_search_depends_on_iteration() {
        let state = ResearchState {
            queries: vec!["q".to_string()],
            ..ResearchState::new("t")
        };

        let first = search_api(ctx(), state.clone()).await.unwrap();
        assert_eq!(first.raw_results.map(|r| r.len()), Some(2));

        let later = search_api(
            ctx(),
            ResearchState {
                iteration_count: 1,
                ..state
            },
        )
        .await
        .unwrap();
        assert_eq!(later.raw_results.map(|r| r.len()), Some(4));
    }

    #[tokio::test]
    async fn test_search_without_queries_fails() {
        let err = search_api(ctx(), ResearchState::new("t")).await.unwrap_err();
        assert_eq!(err.to_string(), "no search queries to execute");
    }

    #[tokio::test]
    async fn test_evaluate_threshold_and_counter() {
        let two = ResearchState {
            raw_results: vec!["a".into(), "b".into()],
            iteration_count: 0,
            ..ResearchState::new("t")
        };
        let three = ResearchState {
            raw_results: vec!["a".into(), "b".into(), "c".into()],
            iteration_count: 1,
            ..ResearchState::new("t")
        };

        let update = evaluate_results(ctx(), two).await.unwrap();
        assert_eq!(update.is_sufficient, Some(false));
        assert_eq!(update.iteration_count, Some(1));

        let update = evaluate_results(ctx(), three).await.unwrap();
        assert_eq!(update.is_sufficient, Some(true));
        assert_eq!(update.iteration_count, Some(2));
    }

    #[tokio::test]
    async fn test_evaluate_counter_overflow_is_an_error() {
        let state = ResearchState {
            raw_results: vec!["a".into()],
            iteration_count: u32::MAX,
            ..ResearchState::new("t")
        };
        let err = evaluate_results(ctx(), state).await.unwrap_err();

        assert_eq!(err.to_string(), StepError::CounterOverflow.to_string());
    }

    #[tokio::test]
    async fn test_topic_used_verbatim_by_queries_and_draft() {
        let state = ResearchState::new("  Rust  ");
        let queries = generate_queries(ctx(), state.clone()).await.unwrap().queries.unwrap();
        assert_eq!(queries[0], "principles   Rust  ");

        let state = ResearchState {
            raw_results: vec!["a".into()],
            ..state
        };
        let draft = synthesize_report(ctx(), state).await.unwrap().report_draft.unwrap();
        assert!(draft.starts_with("REPORT ON   RUST  \n"));
    }

    #[tokio::test]
    async fn test_refine_returns_new_list() {
        let state = ResearchState {
            queries: vec!["a".into(), "b".into()],
            ..ResearchState::new("t")
        };
        let update = refine_search(ctx(), state.clone()).await.unwrap();

        assert_eq!(
            update.queries,
            Some(vec!["a review".to_string(), "b review".to_string()])
        );
        assert_eq!(state.queries, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_synthesize_report_draft() {
        let state = ResearchState {
            raw_results: REFINED_RESULTS.iter().map(|r| r.to_string()).collect(),
            ..ResearchState::new("ai in education")
        };
        let update = synthesize_report(ctx(), state).await.unwrap();

        assert_eq!(
            update.report_draft.as_deref(),
            Some("REPORT ON AI IN EDUCATION\nBased on 4 key papers, the field shows...")
        );
    }

    #[tokio::test]
    async fn test_human_approval_modes() {
        let auto = human_approval(ctx(), ResearchState::new("t")).await.unwrap();
        assert_eq!(auto, ResearchUpdate::feedback(FEEDBACK_APPROVE));

        let interactive = Arc::new(StepContext::quiet().with_interactive_approval(true));
        let deferred = human_approval(interactive, ResearchState::new("t")).await.unwrap();
        assert!(deferred.is_empty());
    }
}
