use std::sync::Arc;

use super::executor::AgentExecutor;
use super::stability::StabilityDetector;
use crate::errors::{DecisionError, EngineError, EngineResult};
use crate::roles::prompts::{
    coordinator_evaluation_message, coordinator_initial_message, COORDINATOR_EVALUATION_SYSTEM,
    COORDINATOR_INITIAL_SYSTEM,
};
use crate::storage::{RunState, Termination};
use crate::types::{
    AgentName, AgentTask, CoordinatorOutput, Iteration, StoredMessage, WorkerRole,
};

/// Assigns work and decides when the design is done.
///
/// Iteration 0 is the bootstrap: every worker gets a task. Afterwards the
/// coordinator only pays for an evaluation once the system is stable; while
/// agents are still changing it emits a cheap continuation.
pub struct Coordinator {
    executor: Arc<AgentExecutor>,
}

impl Coordinator {
    pub fn new(executor: Arc<AgentExecutor>) -> Self {
        Self { executor }
    }

    /// Runs one coordinator round, then advances the iteration unless the
    /// project is complete. A failed inference fails the run, and so does a
    /// second round at an iteration that already has a coordinator output.
    /// Nothing is delivered or marked until the output is committed.
    pub async fn process(&self, state: &mut RunState) -> EngineResult<CoordinatorOutput> {
        let iteration = state.current_iteration;
        if state.coordinator_outputs().contains_key(&iteration) {
            return Err(EngineError::OutputAlreadyCommitted {
                agent: AgentName::Coordinator,
                iteration,
            });
        }

        let (output, evaluated) = if iteration == 0 {
            (self.bootstrap(state).await?, false)
        } else if !StabilityDetector::is_stable(state) {
            let unsettled: Vec<&str> = StabilityDetector::unsettled(state)
                .iter()
                .map(|a| a.as_str())
                .collect();
            log::info!(
                "Iteration {}: not stable yet ({} still changing), continuing",
                iteration,
                unsettled.join(", ")
            );
            (
                CoordinatorOutput::continuation("Agents still converging", iteration),
                false,
            )
        } else {
            log::info!("Iteration {}: system stable, evaluating design", iteration);
            (self.evaluate(state).await?, true)
        };

        state.commit_coordinator_output(output.clone())?;
        self.dispatch(state, &output);

        if evaluated && !output.project_complete {
            // snooze: no re-evaluation until another full threshold passes
            state.mark_updated(AgentName::Coordinator, iteration);
            log::info!(
                "Iteration {}: evaluation continues the project: {}",
                iteration,
                output.completion_reason
            );
        }

        if output.project_complete {
            log::info!(
                "Project complete at iteration {}: {}",
                iteration,
                output.completion_reason
            );
            state.project_complete = true;
            state.termination = Some(Termination::Completed {
                reason: output.completion_reason.clone(),
            });
        } else {
            state.current_iteration += 1;
        }

        Ok(output)
    }

    async fn bootstrap(&self, state: &RunState) -> EngineResult<CoordinatorOutput> {
        let mut output = self
            .decide(
                COORDINATOR_INITIAL_SYSTEM,
                &coordinator_initial_message(&state.requirements),
                0,
            )
            .await?;

        output.project_complete = false;
        for role in WorkerRole::ALL {
            if output.task_for(role).is_none() {
                log::warn!("Bootstrap assigned no task to {}, using a default", role);
                output.agent_tasks.push(AgentTask::new(
                    role.as_str(),
                    format!(
                        "Produce the initial {} design for these requirements: {}",
                        role,
                        state.requirements.trim()
                    ),
                ));
            }
        }
        log::info!("Bootstrap assigned {} tasks", output.agent_tasks.len());
        Ok(output)
    }

    async fn evaluate(&self, state: &RunState) -> EngineResult<CoordinatorOutput> {
        let latest = WorkerRole::ALL
            .iter()
            .map(|role| match state.latest_output(*role) {
                Some(output) => format!(
                    "- {} (iteration {}): {}",
                    role,
                    output.iteration,
                    output.design.summary()
                ),
                None => format!("- {}: no output yet", role),
            })
            .collect::<Vec<_>>()
            .join("\n");

        self.decide(
            COORDINATOR_EVALUATION_SYSTEM,
            &coordinator_evaluation_message(
                &state.requirements,
                state.current_iteration,
                true,
                &latest,
            ),
            state.current_iteration,
        )
        .await
    }

    async fn decide(
        &self,
        system: &str,
        user: &str,
        iteration: Iteration,
    ) -> EngineResult<CoordinatorOutput> {
        let fail = |source: DecisionError| EngineError::Coordinator { iteration, source };

        let decision = self.executor.decide(system, user, &[]).await.map_err(fail)?;
        let mut output: CoordinatorOutput = serde_json::from_value(decision.value)
            .map_err(|e| fail(DecisionError::InvalidOutput(e.to_string())))?;
        output.iteration = iteration;
        Ok(output)
    }

    /// The coordinator may address any registered agent; unknown names are
    /// dropped.
    fn dispatch(&self, state: &mut RunState, output: &CoordinatorOutput) {
        for task in &output.agent_tasks {
            if task.agent_name.trim().parse::<AgentName>().is_err() {
                log::warn!("Task for unknown agent '{}' ignored", task.agent_name);
            }
        }

        for message in &output.messages {
            match message.to_agent.trim().parse::<AgentName>() {
                Ok(to) => state.deliver(StoredMessage::new(
                    AgentName::Coordinator,
                    to,
                    message.content.clone(),
                    output.iteration,
                )),
                Err(e) => log::warn!("Coordinator message dropped: {}", e),
            }
        }
    }
}
