//! Integration tests for the coordination engine
//!
//! Exercises full runs and single worker rounds through the public API:
//! - Stability detection and coordinator snooze
//! - MAINTAIN vs UPDATE classification
//! - Dependency propagation latency
//! - Communication graph enforcement
//! - Decision failure and retry
//! - Output immutability

use std::sync::Arc;

use uavcoord::engine::{RoundScheduler, StabilityDetector};
use uavcoord::providers::demo::{
    AERODYNAMICS_REPLY, BOOTSTRAP_REPLY, COMPLETE_REPLY, MANUFACTURING_REPLY, MISSION_REPLY,
    PROPULSION_REPLY, STRUCTURES_REPLY,
};
use uavcoord::providers::{demo_provider, MockLLMProvider, MockReply};
use uavcoord::storage::{SkipReason, TurnState, UpdateKind};
use uavcoord::{
    AgentName, AgentTask, CoordinatorOutput, EngineError, RunConfig, RunState, Termination,
    WorkerRole,
};

const EVALUATOR: &str = "evaluating the collaborative design";
const BOOTSTRAPPER: &str = "managing five engineering agents";

const CONTINUE_REPLY: &str = r#"{
  "project_complete": false,
  "completion_reason": "Cost margin too thin",
  "agent_tasks": [{"agent_name": "manufacturing", "task_description": "Look for cheaper materials"}],
  "messages": [{"to_agent": "manufacturing", "content": "Review material cost"}]
}"#;

fn text(s: &str) -> MockReply {
    MockReply::Text(s.to_string())
}

fn create_test_config(max_iterations: u32, stability_threshold: u32) -> RunConfig {
    RunConfig {
        max_iterations,
        stability_threshold,
        ..RunConfig::default()
    }
}

/// Canned provider where one role's replies are replaced by a sequence.
fn provider_with(needle: &str, replies: Vec<MockReply>) -> MockLLMProvider {
    MockLLMProvider::new()
        .on_sequence(needle, replies)
        .on(BOOTSTRAPPER, BOOTSTRAP_REPLY)
        .on(EVALUATOR, COMPLETE_REPLY)
        .on("YOUR ROLE: Mission Planner", MISSION_REPLY)
        .on("YOUR ROLE: Aerodynamics Engineer", AERODYNAMICS_REPLY)
        .on("YOUR ROLE: Propulsion Engineer", PROPULSION_REPLY)
        .on("YOUR ROLE: Structures Engineer", STRUCTURES_REPLY)
        .on("YOUR ROLE: Manufacturing & Cost Engineer", MANUFACTURING_REPLY)
}

/// State positioned just after a bootstrap that assigned every worker.
fn bootstrapped_state(config: &RunConfig) -> RunState {
    let mut state = RunState::new("survey uav", config);
    let mut bootstrap = CoordinatorOutput::continuation("start", 0);
    bootstrap.agent_tasks = WorkerRole::ALL
        .iter()
        .map(|r| AgentTask::new(r.as_str(), "do your part"))
        .collect();
    state.commit_coordinator_output(bootstrap).unwrap();
    state.current_iteration = 1;
    state
}

fn first_output(state: &RunState, role: WorkerRole) -> Option<u32> {
    state.outputs(role).next().map(|(i, _)| *i)
}

#[tokio::test]
async fn test_run_completes_once_stable() {
    let provider = Arc::new(demo_provider());
    let scheduler = RoundScheduler::new(provider.clone(), create_test_config(10, 2)).unwrap();

    let state = scheduler.run("survey uav").await.unwrap();

    assert!(state.project_complete);
    assert_eq!(state.current_iteration, 6);
    assert!(matches!(state.termination, Some(Termination::Completed { .. })));
    assert_eq!(provider.calls_for(EVALUATOR), 1);

    assert_eq!(state.last_update(AgentName::MissionPlanner), Some(1));
    assert_eq!(state.last_update(AgentName::Aerodynamics), Some(2));
    assert_eq!(state.last_update(AgentName::Propulsion), Some(2));
    assert_eq!(state.last_update(AgentName::Structures), Some(3));
    assert_eq!(state.last_update(AgentName::Manufacturing), Some(4));
    assert_eq!(state.last_update(AgentName::Coordinator), None);
}

#[tokio::test]
async fn test_iteration_cap_is_hard_ceiling() {
    let provider = Arc::new(demo_provider());
    let scheduler = RoundScheduler::new(provider.clone(), create_test_config(5, 2)).unwrap();

    let state = scheduler.run("survey uav").await.unwrap();

    assert!(!state.project_complete);
    assert_eq!(state.current_iteration, 5);
    assert_eq!(
        state.termination,
        Some(Termination::MaxIterations { iteration: 5 })
    );
    assert_eq!(provider.calls_for(EVALUATOR), 0);
    for role in WorkerRole::ALL {
        assert!(state.outputs(role).all(|(i, _)| *i <= 4));
    }
    assert!(state.coordinator_outputs().keys().all(|i| *i <= 4));
}

#[tokio::test]
async fn test_resuming_capped_run_stays_at_cap() {
    let provider = Arc::new(demo_provider());
    let scheduler = RoundScheduler::new(provider.clone(), create_test_config(5, 2)).unwrap();
    let state = scheduler.run("survey uav").await.unwrap();
    let calls = provider.call_count();
    let coordinator_rounds = state.coordinator_outputs().len();

    let resumed = scheduler.run_state(state).await.unwrap();

    assert_eq!(resumed.current_iteration, 5);
    assert_eq!(
        resumed.termination,
        Some(Termination::MaxIterations { iteration: 5 })
    );
    assert_eq!(resumed.coordinator_outputs().len(), coordinator_rounds);
    assert!(resumed.coordinator_outputs().keys().all(|i| *i <= 4));
    assert_eq!(provider.call_count(), calls);
}

#[tokio::test]
async fn test_resuming_completed_run_is_noop() {
    let provider = Arc::new(demo_provider());
    let scheduler = RoundScheduler::new(provider.clone(), create_test_config(10, 2)).unwrap();
    let state = scheduler.run("survey uav").await.unwrap();
    assert!(state.project_complete);
    let messages = state.total_messages();

    let resumed = scheduler.run_state(state).await.unwrap();

    assert!(resumed.project_complete);
    assert_eq!(resumed.current_iteration, 6);
    assert_eq!(provider.calls_for(EVALUATOR), 1);
    assert_eq!(resumed.total_messages(), messages);
    assert!(matches!(
        resumed.termination,
        Some(Termination::Completed { .. })
    ));
}

#[tokio::test]
async fn test_stability_boundary() {
    let mut state = RunState::new("req", &create_test_config(20, 3));
    state.current_iteration = 2;
    assert!(!StabilityDetector::is_stable(&state));
}

#[tokio::test]
async fn test_coordinator_snooze_delays_next_evaluation() {
    let provider = Arc::new(provider_with(
        EVALUATOR,
        vec![text(CONTINUE_REPLY), text(COMPLETE_REPLY)],
    ));
    let scheduler = RoundScheduler::new(provider.clone(), create_test_config(20, 2)).unwrap();

    let state = scheduler.run("survey uav").await.unwrap();

    assert_eq!(provider.calls_for(EVALUATOR), 2);
    assert_eq!(state.last_update(AgentName::Coordinator), Some(6));
    // stable at 6, snoozed, unstable at 7, evaluated again at 8
    assert_eq!(state.current_iteration, 8);
    assert!(state.project_complete);
    assert!(!state.coordinator_outputs()[&7].project_complete);
    assert!(state.coordinator_outputs()[&7].agent_tasks.is_empty());

    let inbox: Vec<_> = state
        .mailbox(AgentName::Manufacturing)
        .iter()
        .filter(|m| m.from_agent == AgentName::Coordinator)
        .collect();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].iteration, 6);
}

#[tokio::test]
async fn test_maintain_and_update_classification() {
    let mut changed: serde_json::Value = serde_json::from_str(MISSION_REPLY).unwrap();
    changed["mtow"] = serde_json::json!(16.5);
    let mut chatty: serde_json::Value = serde_json::from_str(MISSION_REPLY).unwrap();
    chatty["messages"] = serde_json::json!([{"to_agent": "structures", "content": "still 15 kg"}]);

    let provider = provider_with(
        "YOUR ROLE: Mission Planner",
        vec![
            text(MISSION_REPLY),
            text(&chatty.to_string()),
            text(&changed.to_string()),
        ],
    );
    let config = create_test_config(20, 2);
    let scheduler = RoundScheduler::new(Arc::new(provider), config.clone()).unwrap();
    let mut state = bootstrapped_state(&config);

    for iteration in 1..=3 {
        state.current_iteration = iteration;
        scheduler.run_worker_round(&mut state).await.unwrap();
    }

    let update_at = |i| match state.turn(WorkerRole::MissionPlanner, i) {
        Some(TurnState::Committed { update, .. }) => Some(*update),
        _ => None,
    };
    assert_eq!(update_at(1), Some(UpdateKind::Update));
    assert_eq!(update_at(2), Some(UpdateKind::Maintain));
    assert_eq!(update_at(3), Some(UpdateKind::Update));
    assert_eq!(state.last_update(AgentName::MissionPlanner), Some(3));
}

#[tokio::test]
async fn test_dependency_latency_one_round_per_hop() {
    let config = create_test_config(20, 3);
    let scheduler = RoundScheduler::new(Arc::new(demo_provider()), config.clone()).unwrap();
    let mut state = bootstrapped_state(&config);

    // mission plan committed at iteration 0 only
    state.current_iteration = 0;
    let planner_only = RoundScheduler::new(
        Arc::new(MockLLMProvider::new().on("YOUR ROLE: Mission Planner", MISSION_REPLY)),
        config.clone(),
    )
    .unwrap();
    planner_only.run_worker_round(&mut state).await.unwrap();
    assert!(state.output_at(WorkerRole::MissionPlanner, 0).is_some());

    state.current_iteration = 1;
    scheduler.run_worker_round(&mut state).await.unwrap();
    assert!(state.output_at(WorkerRole::Aerodynamics, 1).is_some());
    assert!(!state.has_output(WorkerRole::Structures));
    assert_eq!(
        state.turn(WorkerRole::Structures, 1),
        Some(&TurnState::Skipped {
            reason: SkipReason::DependenciesNotReady(vec![WorkerRole::Aerodynamics])
        })
    );

    state.current_iteration = 2;
    scheduler.run_worker_round(&mut state).await.unwrap();
    assert_eq!(first_output(&state, WorkerRole::Structures), Some(2));
    assert!(!state.has_output(WorkerRole::Manufacturing));

    state.current_iteration = 3;
    scheduler.run_worker_round(&mut state).await.unwrap();
    assert_eq!(first_output(&state, WorkerRole::Manufacturing), Some(3));
}

#[tokio::test]
async fn test_messages_respect_communication_graph() {
    let mut noisy: serde_json::Value = serde_json::from_str(PROPULSION_REPLY).unwrap();
    noisy["messages"] = serde_json::json!([
        {"to_agent": "manufacturing", "content": "motor cost is low"},
        {"to_agent": "aerodynamics", "content": "need cruise drag"}
    ]);

    let provider = provider_with(
        "YOUR ROLE: Propulsion Engineer",
        vec![text(&noisy.to_string()), text(PROPULSION_REPLY)],
    );
    let scheduler = RoundScheduler::new(Arc::new(provider), create_test_config(10, 2)).unwrap();

    let state = scheduler.run("survey uav").await.unwrap();

    assert!(state
        .mailbox(AgentName::Manufacturing)
        .iter()
        .all(|m| m.from_agent != AgentName::Propulsion));

    let from_propulsion: Vec<_> = state
        .mailbox(AgentName::Aerodynamics)
        .iter()
        .filter(|m| m.from_agent == AgentName::Propulsion)
        .collect();
    assert_eq!(from_propulsion.len(), 1);
    assert_eq!(from_propulsion[0].iteration, 2);
    assert_eq!(from_propulsion[0].content, "need cruise drag");
}

#[tokio::test]
async fn test_failed_decision_retried_next_round() {
    let provider = provider_with(
        "YOUR ROLE: Mission Planner",
        vec![
            MockReply::Error("backend unavailable".to_string()),
            text("not json at all"),
            text(MISSION_REPLY),
        ],
    );
    let scheduler = RoundScheduler::new(Arc::new(provider), create_test_config(20, 2)).unwrap();

    let state = scheduler.run("survey uav").await.unwrap();

    assert!(matches!(
        state.turn(WorkerRole::MissionPlanner, 1),
        Some(TurnState::Failed { .. })
    ));
    assert!(matches!(
        state.turn(WorkerRole::MissionPlanner, 2),
        Some(TurnState::Failed { .. })
    ));
    assert_eq!(first_output(&state, WorkerRole::MissionPlanner), Some(3));
    assert_eq!(first_output(&state, WorkerRole::Aerodynamics), Some(4));
    assert!(state.project_complete);
}

#[tokio::test]
async fn test_committed_outputs_are_immutable() {
    let mut changed: serde_json::Value = serde_json::from_str(MISSION_REPLY).unwrap();
    changed["mtow"] = serde_json::json!(18.0);

    let provider = provider_with(
        "YOUR ROLE: Mission Planner",
        vec![text(MISSION_REPLY), text(&changed.to_string())],
    );
    let config = create_test_config(20, 2);
    let scheduler = RoundScheduler::new(Arc::new(provider), config.clone()).unwrap();
    let mut state = bootstrapped_state(&config);

    scheduler.run_worker_round(&mut state).await.unwrap();
    let original = state.output_at(WorkerRole::MissionPlanner, 1).cloned().unwrap();

    // re-entering the same iteration must not touch the committed slot
    let outcomes = scheduler.run_worker_round(&mut state).await.unwrap();
    let planner = outcomes
        .iter()
        .find(|o| o.role == WorkerRole::MissionPlanner)
        .unwrap();
    assert!(matches!(
        planner.result,
        uavcoord::engine::TurnResult::Skipped(SkipReason::AlreadyCommitted)
    ));

    state.current_iteration = 2;
    scheduler.run_worker_round(&mut state).await.unwrap();
    assert_eq!(state.output_at(WorkerRole::MissionPlanner, 1), Some(&original));
    assert_ne!(
        state.output_at(WorkerRole::MissionPlanner, 2).map(|o| &o.design),
        Some(&original.design)
    );

    let err = state.commit_output(original).unwrap_err();
    assert!(matches!(err, EngineError::OutputAlreadyCommitted { iteration: 1, .. }));
}

#[tokio::test]
async fn test_coordinator_failure_fails_run() {
    let provider = provider_with(
        EVALUATOR,
        vec![MockReply::Error("evaluation backend down".to_string())],
    );
    let scheduler = RoundScheduler::new(Arc::new(provider), create_test_config(20, 2)).unwrap();

    let err = scheduler.run("survey uav").await.unwrap_err();
    assert!(matches!(err, EngineError::Coordinator { iteration: 6, .. }));
}
