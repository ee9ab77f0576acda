//! What a worker sees when it decides: everything is read from the state
//! committed before the round started.

use std::fmt::Write;

use crate::storage::RunState;
use crate::types::{AgentOutput, Iteration, StoredMessage, WorkerRole};

#[derive(Debug)]
pub struct WorkerContext<'a> {
    pub role: WorkerRole,
    pub iteration: Iteration,
    pub requirements: &'a str,
    pub task: &'a str,
    /// Latest committed output of each declared dependency
    pub dependencies: Vec<(WorkerRole, &'a AgentOutput)>,
    /// Messages addressed to this agent during the previous iteration only
    pub inbox: Vec<&'a StoredMessage>,
    pub previous: Option<&'a AgentOutput>,
    pub peers: Vec<(WorkerRole, &'a AgentOutput)>,
    pub sent: Vec<&'a StoredMessage>,
    pub received: Vec<&'a StoredMessage>,
}

impl<'a> WorkerContext<'a> {
    pub fn gather(role: WorkerRole, state: &'a RunState, task: &'a str) -> Self {
        let iteration = state.current_iteration;
        let me = role.agent();

        let latest = move |roles: &[WorkerRole]| -> Vec<(WorkerRole, &'a AgentOutput)> {
            roles
                .iter()
                .filter_map(|r| state.latest_output(*r).map(|o| (*r, o)))
                .collect()
        };

        let inbox = match iteration.checked_sub(1) {
            Some(previous) => state.mailbox(me).messages_for(previous).collect(),
            None => Vec::new(),
        };

        let received: Vec<&StoredMessage> = state
            .mailbox(me)
            .iter()
            .filter(|m| m.iteration < iteration)
            .collect();

        let mut sent: Vec<&StoredMessage> = state
            .mailboxes()
            .flat_map(|(_, mailbox)| mailbox.iter())
            .filter(|m| m.from_agent == me && m.iteration < iteration)
            .collect();
        sent.sort_by_key(|m| (m.iteration, m.timestamp));

        Self {
            role,
            iteration,
            requirements: &state.requirements,
            task,
            dependencies: latest(role.dependencies()),
            inbox,
            previous: state.output_before(role, iteration),
            peers: latest(role.peers()),
            sent,
            received,
        }
    }

    /// Render as the user turn of the decision prompt.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "PROJECT REQUIREMENTS:\n{}\n", self.requirements.trim());
        let _ = writeln!(out, "ITERATION: {}", self.iteration);
        let _ = writeln!(out, "YOUR TASK: {}\n", self.task);

        if !self.dependencies.is_empty() {
            let _ = writeln!(out, "DEPENDENCY OUTPUTS:");
            for (role, output) in &self.dependencies {
                let _ = writeln!(out, "- {} (iteration {}): {}", role, output.iteration, design_json(output));
            }
            out.push('\n');
        }

        match self.previous {
            Some(output) => {
                let _ = writeln!(
                    out,
                    "YOUR PREVIOUS OUTPUT (iteration {}). Repeat it exactly to MAINTAIN:\n{}\n",
                    output.iteration,
                    design_json(output)
                );
            }
            None => {
                let _ = writeln!(out, "YOUR PREVIOUS OUTPUT: none, this is your first design.\n");
            }
        }

        if self.inbox.is_empty() {
            let _ = writeln!(out, "NEW MESSAGES: none\n");
        } else {
            let _ = writeln!(out, "NEW MESSAGES:");
            for m in &self.inbox {
                let _ = writeln!(out, "- from {}: {}", m.from_agent, m.content);
            }
            out.push('\n');
        }

        let peers: Vec<_> = self
            .peers
            .iter()
            .filter(|(r, _)| !self.role.dependencies().contains(r))
            .collect();
        if !peers.is_empty() {
            let _ = writeln!(out, "PEER OUTPUTS:");
            for (role, output) in peers {
                let _ = writeln!(out, "- {}: {}", role, output.design.summary());
            }
            out.push('\n');
        }

        if !self.sent.is_empty() || !self.received.is_empty() {
            let _ = writeln!(out, "CONVERSATION HISTORY:");
            for m in &self.received {
                let _ = writeln!(out, "- [{}] {} -> you: {}", m.iteration, m.from_agent, m.content);
            }
            for m in &self.sent {
                let _ = writeln!(out, "- [{}] you -> {}: {}", m.iteration, m.to_agent, m.content);
            }
            out.push('\n');
        }

        out.push_str("Decide whether to UPDATE or MAINTAIN your design and reply in the required format.");
        out
    }
}

fn design_json(output: &AgentOutput) -> String {
    serde_json::to_value(&output.design)
        .ok()
        .and_then(|mut v| {
            // the role tag is noise to the agent
            if let Some(fields) = v.as_object_mut() {
                fields.remove("role");
            }
            serde_json::to_string(&v).ok()
        })
        .unwrap_or_default()
}
