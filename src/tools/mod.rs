pub mod calculators;
pub mod runtime;

pub use runtime::ToolRuntime;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    WeightEstimator,
    AerodynamicCalculator,
    PowerRequirementCalculator,
    CostEstimator,
    FeasibilityChecker,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::WeightEstimator,
        ToolKind::AerodynamicCalculator,
        ToolKind::PowerRequirementCalculator,
        ToolKind::CostEstimator,
        ToolKind::FeasibilityChecker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::WeightEstimator => "weight_estimator",
            ToolKind::AerodynamicCalculator => "aerodynamic_calculator",
            ToolKind::PowerRequirementCalculator => "power_requirement_calculator",
            ToolKind::CostEstimator => "cost_estimator",
            ToolKind::FeasibilityChecker => "feasibility_checker",
        }
    }
}

impl FromStr for ToolKind {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| UnknownTool(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tool '{0}'")]
pub struct UnknownTool(pub String);

/// Pure calculation with named, typed arguments. Tools never touch run state.
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;

    fn invoke(&self, params: &Value) -> Result<Value>;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub kind: ToolKind,
    pub params: Value,
}

/// One tool call made while reaching a decision, kept for the turn ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: ToolKind,
    pub arguments: Value,
    pub result: Value,
}
