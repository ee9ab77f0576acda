use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::collections::HashMap;

use super::calculators::{
    AerodynamicCalculator, CostEstimator, FeasibilityChecker, PowerRequirementCalculator,
    WeightEstimator,
};
use super::{Tool, ToolCall, ToolKind};

pub struct ToolRuntime {
    tools: HashMap<ToolKind, Box<dyn Tool>>,
}

impl ToolRuntime {
    pub fn new() -> Self {
        let mut tools: HashMap<ToolKind, Box<dyn Tool>> = HashMap::new();

        tools.insert(ToolKind::WeightEstimator, Box::new(WeightEstimator));
        tools.insert(ToolKind::AerodynamicCalculator, Box::new(AerodynamicCalculator));
        tools.insert(
            ToolKind::PowerRequirementCalculator,
            Box::new(PowerRequirementCalculator),
        );
        tools.insert(ToolKind::CostEstimator, Box::new(CostEstimator));
        tools.insert(ToolKind::FeasibilityChecker, Box::new(FeasibilityChecker));

        Self { tools }
    }

    pub fn get_schemas(&self, allowed: &[ToolKind]) -> Vec<Value> {
        allowed
            .iter()
            .filter_map(|t| self.tools.get(t))
            .map(|tool| {
                json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "parameters": tool.parameters_schema(),
                })
            })
            .collect()
    }

    pub fn execute(&self, tool_call: &ToolCall) -> Result<Value> {
        let tool = self
            .tools
            .get(&tool_call.kind)
            .ok_or_else(|| anyhow!("Unknown tool: {}", tool_call.kind.as_str()))?;

        tool.invoke(&tool_call.params)
    }
}

impl Default for ToolRuntime {
    fn default() -> Self {
        Self::new()
    }
}
