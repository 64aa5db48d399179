//! End-to-end runs of the research workflow with pacing and narration off

use research_assistant::state::{FEEDBACK_APPROVE, FEEDBACK_PENDING};
use research_assistant::steps::REFINED_RESULTS;
use research_assistant::{
    AppConfig, AppError, Decision, ResearchState, ResearchStep, ResearchUpdate, ResearchWorkflow, StepContext,
};
use stepgraph_core::{Checkpoint, GraphError, NodeKey, RunConfig, RunOutcome, VisualizationOptions};

const TOPIC: &str = "Impact of generative AI on higher education";

const ONE_PASS: [ResearchStep; 8] = [
    ResearchStep::GenerateQueries,
    ResearchStep::SearchApi,
    ResearchStep::EvaluateResults,
    ResearchStep::RefineSearch,
    ResearchStep::SearchApi,
    ResearchStep::EvaluateResults,
    ResearchStep::SynthesizeReport,
    ResearchStep::HumanApproval,
];

fn auto_workflow() -> ResearchWorkflow {
    ResearchWorkflow::new(StepContext::quiet()).unwrap()
}

fn interactive_workflow() -> ResearchWorkflow {
    ResearchWorkflow::new(StepContext::quiet().with_interactive_approval(true)).unwrap()
}

fn limited(limit: usize) -> RunConfig {
    RunConfig::new().with_tag("test").with_recursion_limit(limit)
}

#[tokio::test]
async fn test_default_run_refines_once_then_approves() {
    let outcome = auto_workflow()
        .graph()
        .invoke_with_config(ResearchState::new(TOPIC), limited(25))
        .await
        .unwrap();

    let RunOutcome::Completed(summary) = outcome else {
        panic!("run should complete without interrupts");
    };
    assert_eq!(summary.visited, ONE_PASS.to_vec());
    assert_eq!(summary.steps, 8);

    let state = summary.state;
    assert_eq!(state.topic, TOPIC);
    assert_eq!(state.iteration_count, 2);
    assert!(state.is_sufficient);
    assert_eq!(state.raw_results, REFINED_RESULTS.iter().map(|r| r.to_string()).collect::<Vec<_>>());
    assert_eq!(
        state.queries,
        vec![
            format!("principles {} review", TOPIC),
            format!("recent advances {} review", TOPIC),
            format!("{} methodology review", TOPIC),
        ]
    );
    assert_eq!(
        state.report_draft,
        "REPORT ON IMPACT OF GENERATIVE AI ON HIGHER EDUCATION\nBased on 4 key papers, the field shows..."
    );
    assert_eq!(state.human_feedback, FEEDBACK_APPROVE);
}

#[tokio::test]
async fn test_plain_invoke_returns_final_state() {
    let state = auto_workflow().graph().invoke(ResearchState::new("Rust")).await.unwrap();

    assert!(state.is_approved());
    assert_eq!(state.report_draft, "REPORT ON RUST\nBased on 4 key papers, the field shows...");
}

#[tokio::test]
async fn test_blank_topic_fails_with_snapshot() {
    let err = auto_workflow().graph().invoke(ResearchState::new("")).await.unwrap_err();

    match &err {
        GraphError::NodeExecution { node, .. } => assert_eq!(node, "generate_queries"),
        other => panic!("unexpected error: {other}"),
    }
    let snapshot = err.snapshot().unwrap();
    assert_eq!(snapshot["topic"], "");
    assert_eq!(snapshot["human_feedback"], FEEDBACK_PENDING);
}

#[tokio::test]
async fn test_interactive_run_suspends_with_draft() {
    let workflow = interactive_workflow();
    let outcome = workflow
        .graph()
        .invoke_with_config(ResearchState::new(TOPIC), limited(25))
        .await
        .unwrap();

    let checkpoint = outcome.into_checkpoint().expect("run should suspend for review");
    assert_eq!(checkpoint.node, ResearchStep::HumanApproval);
    assert_eq!(checkpoint.step, 8);
    assert_eq!(checkpoint.tags, vec!["test"]);
    assert!(checkpoint.state.report_draft.starts_with("REPORT ON IMPACT"));
    assert_eq!(checkpoint.state.human_feedback, FEEDBACK_PENDING);

    let resumed = workflow
        .graph()
        .resume(
            checkpoint,
            Some(ResearchUpdate::feedback(Decision::Approve.feedback())),
            limited(25),
        )
        .await
        .unwrap();
    assert!(resumed.is_completed());
    assert_eq!(resumed.visited(), ONE_PASS.as_slice());
}

#[tokio::test]
async fn test_retry_loops_back_and_suspends_again() {
    let workflow = interactive_workflow();
    let mut decisions = vec![Decision::Approve, Decision::Retry];
    let mut drafts = Vec::new();

    let summary = workflow
        .run(ResearchState::new(TOPIC), limited(25), &mut |draft: &str| -> research_assistant::Result<Decision> {
            drafts.push(draft.to_string());
            Ok(decisions.pop().unwrap_or(Decision::Approve))
        })
        .await
        .unwrap();

    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0], drafts[1]);
    assert_eq!(summary.steps, 16);
    assert_eq!(&summary.visited[..8], ONE_PASS.as_slice());
    assert_eq!(&summary.visited[8..], ONE_PASS.as_slice());
    assert!(summary.state.is_approved());
    assert_eq!(summary.state.iteration_count, 2);
}

#[tokio::test]
async fn test_endless_retries_hit_the_transition_guard() {
    let workflow = interactive_workflow();
    let mut prompts = 0;

    let err = workflow
        .run(ResearchState::new(TOPIC), limited(25), &mut |_: &str| -> research_assistant::Result<Decision> {
            prompts += 1;
            Ok(Decision::Retry)
        })
        .await
        .unwrap_err();

    assert_eq!(prompts, 3);
    match err {
        AppError::Graph(GraphError::RecursionLimit { limit, node }) => {
            assert_eq!(limit, 25);
            assert_eq!(node, "search_api");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_small_limit_stops_before_refining() {
    let err = auto_workflow()
        .graph()
        .invoke_with_config(ResearchState::new(TOPIC), limited(3))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GraphError::RecursionLimit { limit: 3, ref node } if node == "refine_search"
    ));
}

#[tokio::test]
async fn test_prompt_failure_aborts_run() {
    let err = interactive_workflow()
        .run(ResearchState::new(TOPIC), RunConfig::new(), &mut |_: &str| -> research_assistant::Result<Decision> {
            Err(AppError::Prompt("terminal closed".to_string()))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Prompt(_)));
}

#[tokio::test]
async fn test_checkpoint_json_round_trip_resumes() {
    let workflow = interactive_workflow();
    let checkpoint = workflow
        .graph()
        .invoke_with_config(ResearchState::new(TOPIC), RunConfig::new())
        .await
        .unwrap()
        .into_checkpoint()
        .unwrap();

    let json = checkpoint.to_json().unwrap();
    assert!(json.contains("\"node\": \"human_approval\""));

    let restored: Checkpoint<ResearchStep, ResearchState> = Checkpoint::from_json(&json).unwrap();
    assert_eq!(restored.run_id, checkpoint.run_id);
    assert_eq!(restored.visited, checkpoint.visited);
    assert_eq!(restored.state, checkpoint.state);

    let outcome = workflow
        .graph()
        .resume(
            restored,
            Some(ResearchUpdate::feedback(FEEDBACK_APPROVE)),
            RunConfig::new(),
        )
        .await
        .unwrap();

    let RunOutcome::Completed(summary) = outcome else {
        panic!("approved run should complete");
    };
    assert_eq!(summary.run_id, checkpoint.run_id);
    assert!(summary.state.is_approved());
}

#[tokio::test]
async fn test_run_config_comes_from_app_config() {
    let config = AppConfig {
        tags: vec!["cli".to_string()],
        max_transitions: 3,
        ..AppConfig::default()
    };

    let err = auto_workflow()
        .graph()
        .invoke_with_config(ResearchState::new(TOPIC), research_assistant::run_config(&config))
        .await
        .unwrap_err();

    assert!(matches!(err, GraphError::RecursionLimit { limit: 3, .. }));
}

#[test]
fn test_diagram_lists_every_step_and_router() {
    let workflow = auto_workflow();
    let mermaid = workflow.graph().draw_mermaid();
    let dot = workflow.graph().visualize(&VisualizationOptions::dot());

    for step in ResearchStep::ALL {
        assert!(mermaid.contains(step.as_str()), "mermaid missing {step}");
        assert!(dot.contains(step.as_str()), "dot missing {step}");
    }
    for marker in ["__start__", "__end__", "route_evaluation", "route_human_feedback"] {
        assert!(mermaid.contains(marker));
        assert!(dot.contains(marker));
    }
}
