//! Routing decisions for the research workflow
//!
//! Routers are pure functions of the state so runs replay deterministically.
//! Each comes with the destination set it is registered with.

use crate::state::ResearchState;
use crate::steps::ResearchStep;
use stepgraph_core::Target;

/// Router name for the sufficiency decision
pub const ROUTE_EVALUATION: &str = "route_evaluation";

/// Router name for the review decision
pub const ROUTE_HUMAN_FEEDBACK: &str = "route_human_feedback";

/// Destinations `route_evaluation` may pick
pub const EVALUATION_DESTINATIONS: [Target<ResearchStep>; 2] = [
    Target::Node(ResearchStep::SynthesizeReport),
    Target::Node(ResearchStep::RefineSearch),
];

/// Destinations `route_human_feedback` may pick
pub const FEEDBACK_DESTINATIONS: [Target<ResearchStep>; 2] =
    [Target::End, Target::Node(ResearchStep::GenerateQueries)];

/// Synthesize once results are sufficient, otherwise refine the search
pub fn route_evaluation(state: &ResearchState) -> Target<ResearchStep> {
    if state.is_sufficient {
        Target::Node(ResearchStep::SynthesizeReport)
    } else {
        Target::Node(ResearchStep::RefineSearch)
    }
}

/// Finish on approval; any other feedback restarts the research
pub fn route_human_feedback(state: &ResearchState) -> Target<ResearchStep> {
    if state.is_approved() {
        Target::End
    } else {
        Target::Node(ResearchStep::GenerateQueries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FEEDBACK_APPROVE, FEEDBACK_PENDING, FEEDBACK_RETRY};
    use proptest::prelude::*;

    fn with_feedback(feedback: &str) -> ResearchState {
        ResearchState {
            human_feedback: feedback.to_string(),
            ..ResearchState::default()
        }
    }

    #[test]
    fn test_route_evaluation_both_values() {
        let mut state = ResearchState::default();
        assert_eq!(route_evaluation(&state), Target::Node(ResearchStep::RefineSearch));

        state.is_sufficient = true;
        assert_eq!(route_evaluation(&state), Target::Node(ResearchStep::SynthesizeReport));
    }

    #[test]
    fn test_route_human_feedback_known_values() {
        assert_eq!(route_human_feedback(&with_feedback(FEEDBACK_APPROVE)), Target::End);
        assert_eq!(
            route_human_feedback(&with_feedback(FEEDBACK_PENDING)),
            Target::Node(ResearchStep::GenerateQueries)
        );
        assert_eq!(
            route_human_feedback(&with_feedback(FEEDBACK_RETRY)),
            Target::Node(ResearchStep::GenerateQueries)
        );
    }

    proptest! {
        #[test]
        fn prop_route_evaluation_stays_declared(sufficient in any::<bool>(), iteration in any::<u32>()) {
            let state = ResearchState {
                is_sufficient: sufficient,
                iteration_count: iteration,
                ..ResearchState::default()
            };
            let target = route_evaluation(&state);

            prop_assert!(EVALUATION_DESTINATIONS.contains(&target));
            prop_assert_eq!(target == Target::Node(ResearchStep::SynthesizeReport), sufficient);
        }

        #[test]
        fn prop_only_approve_ends(
            feedback in prop_oneof![Just(FEEDBACK_APPROVE.to_string()), "\\PC{0,12}"],
        ) {
            let target = route_human_feedback(&with_feedback(&feedback));

            prop_assert!(FEEDBACK_DESTINATIONS.contains(&target));
            prop_assert_eq!(target == Target::End, feedback == FEEDBACK_APPROVE);
        }
    }
}
