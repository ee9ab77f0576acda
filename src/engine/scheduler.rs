use futures::future::join_all;
use std::sync::Arc;

use super::coordinator::Coordinator;
use super::executor::{AgentExecutor, ExecutorConfig};
use super::worker::{TurnResult, WorkerAgent, WorkerOutcome};
use crate::config::RunConfig;
use crate::errors::EngineResult;
use crate::providers::LLMProvider;
use crate::storage::{RunState, Termination, UpdateKind};
use crate::types::WorkerRole;

/// Drives a run: coordinator round, then all workers concurrently, until the
/// coordinator declares completion or the iteration cap is hit.
pub struct RoundScheduler {
    coordinator: Coordinator,
    workers: Vec<WorkerAgent>,
    config: RunConfig,
}

impl RoundScheduler {
    pub fn new(llm_provider: Arc<dyn LLMProvider>, config: RunConfig) -> EngineResult<Self> {
        config.validate()?;
        let executor = Arc::new(AgentExecutor::new(
            llm_provider,
            ExecutorConfig::from(&config),
        ));

        Ok(Self {
            coordinator: Coordinator::new(executor.clone()),
            workers: WorkerRole::ALL
                .into_iter()
                .map(|role| WorkerAgent::new(role, executor.clone()))
                .collect(),
            config,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub async fn run(&self, requirements: &str) -> EngineResult<RunState> {
        let state = RunState::new(requirements, &self.config);
        log::info!("Starting run {}", state.run_id);
        self.run_state(state).await
    }

    /// Continue a run from an existing state. A completed or capped state is
    /// returned as is.
    pub async fn run_state(&self, mut state: RunState) -> EngineResult<RunState> {
        while !finished(&mut state) {
            self.coordinator.process(&mut state).await?;

            if finished(&mut state) {
                break;
            }
            self.run_worker_round(&mut state).await?;
        }

        Ok(state)
    }

    /// All workers decide against the same committed snapshot; their
    /// outcomes are merged afterwards, so nothing a worker commits this round
    /// is visible to another worker until the next one.
    pub async fn run_worker_round(&self, state: &mut RunState) -> EngineResult<Vec<WorkerOutcome>> {
        let iteration = state.current_iteration;
        log::info!("Iteration {}: running {} workers", iteration, self.workers.len());

        let outcomes = {
            let snapshot: &RunState = state;
            join_all(self.workers.iter().map(|w| w.process(snapshot))).await
        };

        let summary: Vec<String> = outcomes
            .iter()
            .map(|o| format!("{}={}", o.role, round_label(o)))
            .collect();

        for outcome in outcomes.iter().cloned() {
            outcome.merge_into(state)?;
        }

        log::info!("Iteration {} results: {}", iteration, summary.join(", "));
        Ok(outcomes)
    }
}

/// Records the cap as the termination when it is what stops the run.
fn finished(state: &mut RunState) -> bool {
    if state.project_complete {
        return true;
    }
    if state.has_reached_max_iterations() {
        log::warn!(
            "Stopping at iteration {}: iteration cap of {} reached",
            state.current_iteration,
            state.max_iterations
        );
        state.termination = Some(Termination::MaxIterations {
            iteration: state.current_iteration,
        });
        return true;
    }
    false
}

fn round_label(outcome: &WorkerOutcome) -> &'static str {
    match &outcome.result {
        TurnResult::Committed {
            update: UpdateKind::Update,
            ..
        } => "UPDATED",
        TurnResult::Committed {
            update: UpdateKind::Maintain,
            ..
        } => "MAINTAINED",
        TurnResult::Failed(_) => "FAILED",
        TurnResult::Skipped(_) => "NO OUTPUT",
    }
}
