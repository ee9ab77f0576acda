//! Static per-role rules: dependency gates, the communication graph, tool
//! sets and prompts.

pub mod prompts;

use crate::storage::RunState;
use crate::tools::ToolKind;
use crate::types::{AgentName, WorkerRole};

impl WorkerRole {
    /// Roles whose committed output must be visible before this one acts.
    pub fn dependencies(&self) -> &'static [WorkerRole] {
        match self {
            WorkerRole::MissionPlanner => &[],
            WorkerRole::Aerodynamics => &[WorkerRole::MissionPlanner],
            WorkerRole::Propulsion => &[WorkerRole::MissionPlanner],
            WorkerRole::Structures => &[WorkerRole::MissionPlanner, WorkerRole::Aerodynamics],
            WorkerRole::Manufacturing => &[WorkerRole::Structures],
        }
    }

    /// Agents this role may message, and whose latest outputs it sees.
    pub fn peers(&self) -> &'static [WorkerRole] {
        match self {
            WorkerRole::MissionPlanner => &[
                WorkerRole::Aerodynamics,
                WorkerRole::Propulsion,
                WorkerRole::Structures,
            ],
            WorkerRole::Aerodynamics => &[
                WorkerRole::MissionPlanner,
                WorkerRole::Propulsion,
                WorkerRole::Structures,
            ],
            WorkerRole::Propulsion => &[WorkerRole::MissionPlanner, WorkerRole::Aerodynamics],
            WorkerRole::Structures => &[
                WorkerRole::MissionPlanner,
                WorkerRole::Aerodynamics,
                WorkerRole::Manufacturing,
            ],
            WorkerRole::Manufacturing => &[WorkerRole::Structures],
        }
    }

    pub fn can_message(&self, recipient: AgentName) -> bool {
        recipient
            .worker()
            .is_some_and(|r| self.peers().contains(&r))
    }

    pub fn tools(&self) -> &'static [ToolKind] {
        match self {
            WorkerRole::MissionPlanner => &[ToolKind::FeasibilityChecker],
            WorkerRole::Aerodynamics => &[
                ToolKind::AerodynamicCalculator,
                ToolKind::WeightEstimator,
            ],
            WorkerRole::Propulsion => &[
                ToolKind::PowerRequirementCalculator,
                ToolKind::WeightEstimator,
            ],
            WorkerRole::Structures => &[ToolKind::WeightEstimator, ToolKind::FeasibilityChecker],
            WorkerRole::Manufacturing => &[ToolKind::CostEstimator, ToolKind::FeasibilityChecker],
        }
    }

    /// Dependencies with no committed output yet. Empty means the gate is
    /// open.
    pub fn missing_dependencies(&self, state: &RunState) -> Vec<WorkerRole> {
        self.dependencies()
            .iter()
            .copied()
            .filter(|dep| !state.has_output(*dep))
            .collect()
    }
}
