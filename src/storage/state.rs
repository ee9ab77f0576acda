use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::mailbox::Mailbox;
use crate::config::RunConfig;
use crate::errors::{EngineError, EngineResult};
use crate::tools::ToolInvocation;
use crate::types::{
    AgentName, AgentOutput, CoordinatorOutput, Iteration, RunId, StoredMessage, WorkerRole,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Update,
    Maintain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    NoTask,
    DependenciesNotReady(Vec<WorkerRole>),
    AlreadyCommitted,
}

/// What happened to one worker in one round. A missing entry means the
/// worker has not been run for that iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnState {
    Skipped { reason: SkipReason },
    Failed { error: String },
    Committed {
        update: UpdateKind,
        tool_calls: Vec<ToolInvocation>,
    },
}

impl TurnState {
    pub fn is_committed(&self) -> bool {
        matches!(self, TurnState::Committed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    Completed { reason: String },
    MaxIterations { iteration: Iteration },
}

/// Everything a run produces. Owned by the scheduler; workers only ever see
/// it through a shared reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: RunId,
    pub requirements: String,
    pub current_iteration: Iteration,
    pub max_iterations: u32,
    pub stability_threshold: u32,
    pub project_complete: bool,
    pub termination: Option<Termination>,
    outputs: BTreeMap<WorkerRole, BTreeMap<Iteration, AgentOutput>>,
    coordinator_outputs: BTreeMap<Iteration, CoordinatorOutput>,
    mailboxes: BTreeMap<AgentName, Mailbox>,
    /// `None` until the agent's first material change.
    last_update_iteration: BTreeMap<AgentName, Option<Iteration>>,
    turns: BTreeMap<WorkerRole, BTreeMap<Iteration, TurnState>>,
}

impl RunState {
    pub fn new(requirements: impl Into<String>, config: &RunConfig) -> Self {
        Self {
            run_id: RunId::new_v4(),
            requirements: requirements.into(),
            current_iteration: 0,
            max_iterations: config.max_iterations,
            stability_threshold: config.stability_threshold,
            project_complete: false,
            termination: None,
            outputs: WorkerRole::ALL
                .into_iter()
                .map(|r| (r, BTreeMap::new()))
                .collect(),
            coordinator_outputs: BTreeMap::new(),
            mailboxes: AgentName::ALL
                .into_iter()
                .map(|a| (a, Mailbox::new()))
                .collect(),
            last_update_iteration: AgentName::ALL.into_iter().map(|a| (a, None)).collect(),
            turns: BTreeMap::new(),
        }
    }

    pub fn outputs(&self, role: WorkerRole) -> impl Iterator<Item = (&Iteration, &AgentOutput)> {
        self.outputs.get(&role).into_iter().flat_map(|m| m.iter())
    }

    pub fn output_at(&self, role: WorkerRole, iteration: Iteration) -> Option<&AgentOutput> {
        self.outputs.get(&role)?.get(&iteration)
    }

    pub fn latest_output(&self, role: WorkerRole) -> Option<&AgentOutput> {
        self.outputs.get(&role)?.values().next_back()
    }

    /// Latest output strictly before `iteration`.
    pub fn output_before(&self, role: WorkerRole, iteration: Iteration) -> Option<&AgentOutput> {
        self.outputs
            .get(&role)?
            .range(..iteration)
            .next_back()
            .map(|(_, o)| o)
    }

    pub fn has_output(&self, role: WorkerRole) -> bool {
        self.outputs.get(&role).is_some_and(|m| !m.is_empty())
    }

    /// Write-once: committing a second output for the same iteration fails.
    pub fn commit_output(&mut self, output: AgentOutput) -> EngineResult<()> {
        let role = output.role();
        let slot = self.outputs.entry(role).or_default();
        if slot.contains_key(&output.iteration) {
            return Err(EngineError::OutputAlreadyCommitted {
                agent: role.agent(),
                iteration: output.iteration,
            });
        }
        slot.insert(output.iteration, output);
        Ok(())
    }

    pub fn coordinator_outputs(&self) -> &BTreeMap<Iteration, CoordinatorOutput> {
        &self.coordinator_outputs
    }

    pub fn latest_coordinator_output(&self) -> Option<&CoordinatorOutput> {
        self.coordinator_outputs.values().next_back()
    }

    pub fn commit_coordinator_output(&mut self, output: CoordinatorOutput) -> EngineResult<()> {
        if self.coordinator_outputs.contains_key(&output.iteration) {
            return Err(EngineError::OutputAlreadyCommitted {
                agent: AgentName::Coordinator,
                iteration: output.iteration,
            });
        }
        self.coordinator_outputs.insert(output.iteration, output);
        Ok(())
    }

    /// Task for the current iteration, else the most recent earlier
    /// assignment for this role.
    pub fn task_for(&self, role: WorkerRole) -> Option<&str> {
        self.coordinator_outputs
            .range(..=self.current_iteration)
            .rev()
            .find_map(|(_, output)| output.task_for(role))
    }

    pub fn mailbox(&self, agent: AgentName) -> &Mailbox {
        static EMPTY: Mailbox = Mailbox::new();
        self.mailboxes.get(&agent).unwrap_or(&EMPTY)
    }

    pub fn mailboxes(&self) -> impl Iterator<Item = (&AgentName, &Mailbox)> {
        self.mailboxes.iter()
    }

    pub fn deliver(&mut self, message: StoredMessage) {
        self.mailboxes
            .entry(message.to_agent)
            .or_default()
            .add(message);
    }

    pub fn total_messages(&self) -> usize {
        self.mailboxes.values().map(Mailbox::len).sum()
    }

    pub fn last_update(&self, agent: AgentName) -> Option<Iteration> {
        self.last_update_iteration.get(&agent).copied().flatten()
    }

    pub fn mark_updated(&mut self, agent: AgentName, iteration: Iteration) {
        self.last_update_iteration.insert(agent, Some(iteration));
    }

    /// Rounds since the agent last changed its output. An agent that never
    /// changed counts as having updated at iteration -1.
    pub fn rounds_since_update(&self, agent: AgentName) -> u32 {
        match self.last_update(agent) {
            Some(last) => self.current_iteration.saturating_sub(last),
            None => self.current_iteration.saturating_add(1),
        }
    }

    pub fn tracked_agents(&self) -> impl Iterator<Item = AgentName> + '_ {
        self.last_update_iteration.keys().copied()
    }

    pub fn turn(&self, role: WorkerRole, iteration: Iteration) -> Option<&TurnState> {
        self.turns.get(&role)?.get(&iteration)
    }

    pub fn turns(&self, role: WorkerRole) -> impl Iterator<Item = (&Iteration, &TurnState)> {
        self.turns.get(&role).into_iter().flat_map(|m| m.iter())
    }

    /// Records a turn. A committed turn is never replaced.
    pub fn record_turn(&mut self, role: WorkerRole, iteration: Iteration, turn: TurnState) {
        let slot = self.turns.entry(role).or_default();
        if slot.get(&iteration).is_some_and(TurnState::is_committed) {
            return;
        }
        slot.insert(iteration, turn);
    }

    pub fn has_reached_max_iterations(&self) -> bool {
        self.current_iteration >= self.max_iterations
    }
}
