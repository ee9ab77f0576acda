use std::sync::Arc;

use super::context::WorkerContext;
use super::executor::AgentExecutor;
use crate::errors::{DecisionError, EngineResult};
use crate::roles::prompts::worker_system_prompt;
use crate::storage::{RunState, SkipReason, TurnState, UpdateKind};
use crate::tools::ToolInvocation;
use crate::types::{AgentName, AgentOutput, Iteration, StoredMessage, WorkerRole};

#[derive(Debug, Clone)]
pub enum TurnResult {
    Skipped(SkipReason),
    Failed(DecisionError),
    Committed {
        output: AgentOutput,
        update: UpdateKind,
        deliveries: Vec<StoredMessage>,
        tool_calls: Vec<ToolInvocation>,
    },
}

/// A worker's contribution to one round, merged into the run state by the
/// scheduler once every worker has finished.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub role: WorkerRole,
    pub iteration: Iteration,
    pub result: TurnResult,
}

impl WorkerOutcome {
    pub fn update(&self) -> Option<UpdateKind> {
        match &self.result {
            TurnResult::Committed { update, .. } => Some(*update),
            _ => None,
        }
    }

    pub fn merge_into(self, state: &mut RunState) -> EngineResult<()> {
        let turn = match self.result {
            TurnResult::Skipped(reason) => TurnState::Skipped { reason },
            TurnResult::Failed(error) => TurnState::Failed {
                error: error.to_string(),
            },
            TurnResult::Committed {
                output,
                update,
                deliveries,
                tool_calls,
            } => {
                state.commit_output(output)?;
                if update == UpdateKind::Update {
                    state.mark_updated(self.role.agent(), self.iteration);
                }
                for message in deliveries {
                    state.deliver(message);
                }
                TurnState::Committed { update, tool_calls }
            }
        };
        state.record_turn(self.role, self.iteration, turn);
        Ok(())
    }
}

pub struct WorkerAgent {
    role: WorkerRole,
    executor: Arc<AgentExecutor>,
}

impl WorkerAgent {
    pub fn new(role: WorkerRole, executor: Arc<AgentExecutor>) -> Self {
        Self { role, executor }
    }

    pub fn role(&self) -> WorkerRole {
        self.role
    }

    /// One turn against a read-only view of the committed state. Never fails;
    /// a decision error is reported in the outcome and retried next round.
    pub async fn process(&self, state: &RunState) -> WorkerOutcome {
        let iteration = state.current_iteration;
        let result = self.turn(state).await;
        if let TurnResult::Failed(error) = &result {
            log::error!("{} failed at iteration {}: {}", self.role, iteration, error);
        }
        WorkerOutcome {
            role: self.role,
            iteration,
            result,
        }
    }

    async fn turn(&self, state: &RunState) -> TurnResult {
        let iteration = state.current_iteration;

        let Some(task) = state.task_for(self.role) else {
            log::debug!("{} has no task, skipping", self.role);
            return TurnResult::Skipped(SkipReason::NoTask);
        };

        let missing = self.role.missing_dependencies(state);
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|r| r.as_str()).collect();
            log::debug!(
                "{} waiting on {} at iteration {}",
                self.role,
                names.join(", "),
                iteration
            );
            return TurnResult::Skipped(SkipReason::DependenciesNotReady(missing));
        }

        if state.output_at(self.role, iteration).is_some() {
            return TurnResult::Skipped(SkipReason::AlreadyCommitted);
        }

        let context = WorkerContext::gather(self.role, state, task);
        let system = worker_system_prompt(
            self.role,
            iteration,
            &self.executor.tool_schemas(self.role.tools()),
        );

        let decision = match self
            .executor
            .decide(&system, &context.render(), self.role.tools())
            .await
        {
            Ok(decision) => decision,
            Err(e) => return TurnResult::Failed(e),
        };

        let output = match AgentOutput::from_decision(self.role, decision.value, iteration) {
            Ok(output) => output,
            Err(e) => return TurnResult::Failed(DecisionError::InvalidOutput(e)),
        };

        let update = match state.output_before(self.role, iteration) {
            Some(previous) if output.maintains(previous) => UpdateKind::Maintain,
            _ => UpdateKind::Update,
        };

        TurnResult::Committed {
            deliveries: self.deliveries(&output),
            output,
            update,
            tool_calls: decision.tool_calls,
        }
    }

    /// Outgoing messages allowed by the communication graph. Everything else
    /// is dropped with a warning.
    fn deliveries(&self, output: &AgentOutput) -> Vec<StoredMessage> {
        let mut allowed = Vec::new();
        for message in &output.messages {
            let recipient = message.to_agent.trim().parse::<AgentName>();
            match recipient {
                Ok(to) if self.role.can_message(to) => allowed.push(StoredMessage::new(
                    self.role.agent(),
                    to,
                    message.content.clone(),
                    output.iteration,
                )),
                _ => log::warn!(
                    "{} may not message '{}', dropping message",
                    self.role,
                    message.to_agent
                ),
            }
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::engine::executor::ExecutorConfig;
    use crate::providers::{MockLLMProvider, MockReply};
    use crate::types::{AgentTask, CoordinatorOutput};

    const PROPULSION: &str = r#"{"engine_power_kw": 1.5, "thrust_n": 40.0, "engine_type": "electric",
        "fuel_consumption_rate": 0.2, "engine_weight_kg": 1.1,
        "messages": [
            {"to_agent": "aerodynamics", "content": "need drag at cruise"},
            {"to_agent": "manufacturing", "content": "motor is cheap"}
        ]}"#;

    const PLAN: &str = r#"{"mtow": 15.0, "range_km": 50.0, "payload_kg": 2.0,
        "endurance_hours": 1.5, "altitude_m": 1500.0}"#;

    fn create_test_worker(role: WorkerRole, provider: MockLLMProvider) -> WorkerAgent {
        let executor = AgentExecutor::new(Arc::new(provider), ExecutorConfig::default());
        WorkerAgent::new(role, Arc::new(executor))
    }

    fn create_test_state(tasks: &[WorkerRole]) -> RunState {
        let mut state = RunState::new("survey uav", &RunConfig::default());
        let mut bootstrap = CoordinatorOutput::continuation("start", 0);
        bootstrap.agent_tasks = tasks
            .iter()
            .map(|r| AgentTask::new(r.as_str(), "do your part"))
            .collect();
        state.commit_coordinator_output(bootstrap).unwrap();
        state.current_iteration = 1;
        state
    }

    async fn seed_plan(state: &mut RunState) {
        let planner = create_test_worker(
            WorkerRole::MissionPlanner,
            MockLLMProvider::new().on("Mission Planner", PLAN),
        );
        planner.process(state).await.merge_into(state).unwrap();
    }

    #[tokio::test]
    async fn test_no_task_skips() {
        let state = create_test_state(&[]);
        let worker = create_test_worker(WorkerRole::MissionPlanner, MockLLMProvider::new());
        let outcome = worker.process(&state).await;
        assert!(matches!(outcome.result, TurnResult::Skipped(SkipReason::NoTask)));
    }

    #[tokio::test]
    async fn test_dependency_gate() {
        let state = create_test_state(&[WorkerRole::Structures]);
        let provider = MockLLMProvider::new();
        let worker = create_test_worker(WorkerRole::Structures, provider);

        let outcome = worker.process(&state).await;
        match outcome.result {
            TurnResult::Skipped(SkipReason::DependenciesNotReady(missing)) => {
                assert_eq!(missing, vec![WorkerRole::MissionPlanner, WorkerRole::Aerodynamics]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_output_is_update_then_maintain() {
        let mut state = create_test_state(&[WorkerRole::MissionPlanner]);
        seed_plan(&mut state).await;
        assert_eq!(state.last_update(AgentName::MissionPlanner), Some(1));

        state.current_iteration = 2;
        let worker = create_test_worker(
            WorkerRole::MissionPlanner,
            MockLLMProvider::new().on("Mission Planner", PLAN),
        );
        let outcome = worker.process(&state).await;
        assert_eq!(outcome.update(), Some(UpdateKind::Maintain));
        outcome.merge_into(&mut state).unwrap();

        assert_eq!(state.last_update(AgentName::MissionPlanner), Some(1));
        assert!(state.output_at(WorkerRole::MissionPlanner, 2).is_some());
    }

    #[tokio::test]
    async fn test_already_committed_guard() {
        let mut state = create_test_state(&[WorkerRole::MissionPlanner]);
        seed_plan(&mut state).await;

        let provider = Arc::new(MockLLMProvider::new().on("Mission Planner", PLAN));
        let executor = AgentExecutor::new(provider.clone(), ExecutorConfig::default());
        let worker = WorkerAgent::new(WorkerRole::MissionPlanner, Arc::new(executor));
        let outcome = worker.process(&state).await;

        assert!(matches!(outcome.result, TurnResult::Skipped(SkipReason::AlreadyCommitted)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_disallowed_messages_dropped() {
        let mut state = create_test_state(&[WorkerRole::MissionPlanner, WorkerRole::Propulsion]);
        seed_plan(&mut state).await;
        state.current_iteration = 2;

        let worker = create_test_worker(
            WorkerRole::Propulsion,
            MockLLMProvider::new().on("Propulsion Engineer", PROPULSION),
        );
        worker.process(&state).await.merge_into(&mut state).unwrap();

        let aero: Vec<_> = state.mailbox(AgentName::Aerodynamics).iter().collect();
        assert_eq!(aero.len(), 1);
        assert_eq!(aero[0].iteration, 2);
        assert_eq!(aero[0].from_agent, AgentName::Propulsion);
        assert!(state.mailbox(AgentName::Manufacturing).is_empty());
    }

    #[tokio::test]
    async fn test_failure_commits_nothing() {
        let mut state = create_test_state(&[WorkerRole::MissionPlanner]);
        let worker = create_test_worker(
            WorkerRole::MissionPlanner,
            MockLLMProvider::new().on_sequence(
                "Mission Planner",
                vec![MockReply::Text(r#"{"mtow": -1}"#.to_string())],
            ),
        );
        let outcome = worker.process(&state).await;
        assert!(matches!(outcome.result, TurnResult::Failed(DecisionError::InvalidOutput(_))));
        outcome.merge_into(&mut state).unwrap();

        assert!(!state.has_output(WorkerRole::MissionPlanner));
        assert!(matches!(
            state.turn(WorkerRole::MissionPlanner, 1),
            Some(TurnState::Failed { .. })
        ));
    }
}
