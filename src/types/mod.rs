pub mod message;
pub mod output;

pub use message::{AgentMessage, StoredMessage};
pub use output::{
    AerodynamicsDesign, AgentOutput, AgentTask, CoordinatorOutput, Design, ManufacturingDesign,
    MissionPlan, PropulsionDesign, StructuresDesign,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Round counter shared by the coordinator and every worker.
pub type Iteration = u32;

pub type RunId = uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentName {
    Coordinator,
    MissionPlanner,
    Aerodynamics,
    Propulsion,
    Structures,
    Manufacturing,
}

impl AgentName {
    pub const ALL: [AgentName; 6] = [
        AgentName::Coordinator,
        AgentName::MissionPlanner,
        AgentName::Aerodynamics,
        AgentName::Propulsion,
        AgentName::Structures,
        AgentName::Manufacturing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentName::Coordinator => "coordinator",
            AgentName::MissionPlanner => "mission_planner",
            AgentName::Aerodynamics => "aerodynamics",
            AgentName::Propulsion => "propulsion",
            AgentName::Structures => "structures",
            AgentName::Manufacturing => "manufacturing",
        }
    }

    pub fn worker(&self) -> Option<WorkerRole> {
        match self {
            AgentName::Coordinator => None,
            AgentName::MissionPlanner => Some(WorkerRole::MissionPlanner),
            AgentName::Aerodynamics => Some(WorkerRole::Aerodynamics),
            AgentName::Propulsion => Some(WorkerRole::Propulsion),
            AgentName::Structures => Some(WorkerRole::Structures),
            AgentName::Manufacturing => Some(WorkerRole::Manufacturing),
        }
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentName {
    type Err = UnknownAgent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentName::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| UnknownAgent(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown agent '{0}'")]
pub struct UnknownAgent(pub String);

/// The five subsystem specialists. The coordinator is not a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRole {
    MissionPlanner,
    Aerodynamics,
    Propulsion,
    Structures,
    Manufacturing,
}

impl WorkerRole {
    pub const ALL: [WorkerRole; 5] = [
        WorkerRole::MissionPlanner,
        WorkerRole::Aerodynamics,
        WorkerRole::Propulsion,
        WorkerRole::Structures,
        WorkerRole::Manufacturing,
    ];

    pub fn agent(&self) -> AgentName {
        match self {
            WorkerRole::MissionPlanner => AgentName::MissionPlanner,
            WorkerRole::Aerodynamics => AgentName::Aerodynamics,
            WorkerRole::Propulsion => AgentName::Propulsion,
            WorkerRole::Structures => AgentName::Structures,
            WorkerRole::Manufacturing => AgentName::Manufacturing,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.agent().as_str()
    }
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<WorkerRole> for AgentName {
    fn from(role: WorkerRole) -> Self {
        role.agent()
    }
}
