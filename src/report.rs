//! Human-readable summaries of a finished run.

use serde::Serialize;
use std::fmt::Write;

use crate::storage::RunState;
use crate::types::{Iteration, WorkerRole};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStatistics {
    pub total_iterations: Iteration,
    pub total_messages: usize,
    /// Workers with at least one committed output
    pub agents_completed: usize,
    pub project_complete: bool,
    pub completion_reason: Option<String>,
}

fn label(role: WorkerRole) -> &'static str {
    match role {
        WorkerRole::MissionPlanner => "Mission",
        WorkerRole::Aerodynamics => "Aero",
        WorkerRole::Propulsion => "Prop",
        WorkerRole::Structures => "Struct",
        WorkerRole::Manufacturing => "Mfg",
    }
}

/// Latest output of each worker, one line per worker that produced any.
pub fn final_design(state: &RunState) -> String {
    let mut out = String::from("=== FINAL UAV DESIGN ===\n");
    for role in WorkerRole::ALL {
        if let Some(output) = state.latest_output(role) {
            let _ = writeln!(out, "{}: {}", role, output.design.summary());
        }
    }
    out
}

/// Which workers committed output in each iteration.
pub fn iteration_summary(state: &RunState) -> String {
    let mut out = String::from("=== ITERATION SUMMARY ===\n");
    for iteration in 0..=state.current_iteration {
        let active: Vec<&str> = WorkerRole::ALL
            .into_iter()
            .filter(|role| state.output_at(*role, iteration).is_some())
            .map(label)
            .collect();
        if !active.is_empty() {
            let _ = writeln!(out, "Iteration {}: {}", iteration, active.join(", "));
        }
    }
    out
}

pub fn statistics(state: &RunState) -> RunStatistics {
    RunStatistics {
        total_iterations: state.current_iteration,
        total_messages: state.total_messages(),
        agents_completed: WorkerRole::ALL
            .into_iter()
            .filter(|role| state.has_output(*role))
            .count(),
        project_complete: state.project_complete,
        completion_reason: state
            .latest_coordinator_output()
            .map(|o| o.completion_reason.clone()),
    }
}

impl RunStatistics {
    pub fn render(&self) -> String {
        let mut out = String::from("=== PROJECT STATISTICS ===\n");
        let _ = writeln!(out, "Total Iterations: {}", self.total_iterations);
        let _ = writeln!(out, "Total Messages: {}", self.total_messages);
        let _ = writeln!(
            out,
            "Agents Completed: {}/{}",
            self.agents_completed,
            WorkerRole::ALL.len()
        );
        let status = if self.project_complete {
            "Complete"
        } else {
            "Incomplete"
        };
        let _ = writeln!(out, "Project Status: {}", status);
        if let Some(reason) = &self.completion_reason {
            let _ = writeln!(out, "Completion Reason: {}", reason);
        }
        out
    }
}
