use crate::storage::RunState;
use crate::types::AgentName;

pub struct StabilityDetector;

impl StabilityDetector {
    /// True once no tracked agent has changed its output for
    /// `stability_threshold` rounds. Never true before that many rounds.
    pub fn is_stable(state: &RunState) -> bool {
        let threshold = state.stability_threshold;
        state.current_iteration >= threshold
            && state
                .tracked_agents()
                .all(|agent| state.rounds_since_update(agent) >= threshold)
    }

    /// Agents that still keep the system from being stable.
    pub fn unsettled(state: &RunState) -> Vec<AgentName> {
        state
            .tracked_agents()
            .filter(|agent| state.rounds_since_update(*agent) < state.stability_threshold)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;

    fn create_test_state(threshold: u32) -> RunState {
        RunState::new(
            "req",
            &RunConfig {
                stability_threshold: threshold,
                ..RunConfig::default()
            },
        )
    }

    #[test]
    fn test_never_stable_below_threshold() {
        let mut state = create_test_state(3);
        state.current_iteration = 2;
        // nothing ever updated, yet still too early
        assert!(!StabilityDetector::is_stable(&state));

        state.current_iteration = 3;
        assert!(StabilityDetector::is_stable(&state));
    }

    #[test]
    fn test_recent_update_blocks_stability() {
        let mut state = create_test_state(2);
        state.mark_updated(AgentName::Structures, 3);

        state.current_iteration = 4;
        assert!(!StabilityDetector::is_stable(&state));
        assert_eq!(StabilityDetector::unsettled(&state), vec![AgentName::Structures]);

        state.current_iteration = 5;
        assert!(StabilityDetector::is_stable(&state));
        assert!(StabilityDetector::unsettled(&state).is_empty());
    }

    #[test]
    fn test_coordinator_counts() {
        let mut state = create_test_state(2);
        state.current_iteration = 6;
        state.mark_updated(AgentName::Coordinator, 5);
        assert!(!StabilityDetector::is_stable(&state));
    }
}
