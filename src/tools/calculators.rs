//! Engineering estimators available to the design agents. The formulas are
//! coarse placeholders.

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{Tool, ToolKind};

fn parse_params<T: DeserializeOwned>(kind: ToolKind, params: &Value) -> Result<T> {
    serde_json::from_value(params.clone())
        .map_err(|e| anyhow!("invalid arguments for {}: {}", kind.as_str(), e))
}

fn material_density(material: &str) -> f64 {
    match material.to_lowercase().as_str() {
        "aluminum" => 2.7,
        "carbon_fiber" => 1.6,
        "steel" => 7.8,
        "plastic" => 1.2,
        _ => 2.0,
    }
}

fn material_cost_per_kg(material: &str) -> f64 {
    match material.to_lowercase().as_str() {
        "aluminum" => 5.0,
        "carbon_fiber" => 50.0,
        "steel" => 2.0,
        "plastic" => 3.0,
        _ => 10.0,
    }
}

pub struct WeightEstimator;

#[derive(Deserialize)]
struct WeightParams {
    length: f64,
    width: f64,
    material: String,
}

impl Tool for WeightEstimator {
    fn kind(&self) -> ToolKind {
        ToolKind::WeightEstimator
    }

    fn description(&self) -> &str {
        "Estimate component weight in kg from dimensions (m) and material"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "length": {"type": "number", "description": "Length in meters"},
                "width": {"type": "number", "description": "Width in meters"},
                "material": {
                    "type": "string",
                    "description": "aluminum, carbon_fiber, steel or plastic"
                }
            },
            "required": ["length", "width", "material"]
        })
    }

    fn invoke(&self, params: &Value) -> Result<Value> {
        let p: WeightParams = parse_params(self.kind(), params)?;
        Ok(json!(p.length * p.width * 0.1 * material_density(&p.material)))
    }
}

pub struct AerodynamicCalculator;

#[derive(Deserialize)]
struct AerodynamicParams {
    wing_area: f64,
    velocity: f64,
}

const LIFT_COEFFICIENT: f64 = 1.2;
const DRAG_COEFFICIENT: f64 = 0.05;
const AIR_DENSITY: f64 = 1.225;

impl Tool for AerodynamicCalculator {
    fn kind(&self) -> ToolKind {
        ToolKind::AerodynamicCalculator
    }

    fn description(&self) -> &str {
        "Calculate lift, drag and lift-to-drag ratio for a wing area (m²) at a velocity (m/s)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "wing_area": {"type": "number", "description": "Wing area in m²"},
                "velocity": {"type": "number", "description": "Airspeed in m/s"}
            },
            "required": ["wing_area", "velocity"]
        })
    }

    fn invoke(&self, params: &Value) -> Result<Value> {
        let p: AerodynamicParams = parse_params(self.kind(), params)?;
        let dynamic = 0.5 * AIR_DENSITY * p.velocity.powi(2) * p.wing_area;
        let lift = dynamic * LIFT_COEFFICIENT;
        let drag = dynamic * DRAG_COEFFICIENT;
        let lift_to_drag = if drag > 0.0 { lift / drag } else { 0.0 };

        Ok(json!({
            "lift_n": lift,
            "drag_n": drag,
            "lift_to_drag": lift_to_drag,
        }))
    }
}

pub struct PowerRequirementCalculator;

#[derive(Deserialize)]
struct PowerParams {
    weight: f64,
    velocity: f64,
}

impl Tool for PowerRequirementCalculator {
    fn kind(&self) -> ToolKind {
        ToolKind::PowerRequirementCalculator
    }

    fn description(&self) -> &str {
        "Calculate required power in kW for a weight (kg) at a velocity (m/s)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "weight": {"type": "number", "description": "Weight in kg"},
                "velocity": {"type": "number", "description": "Velocity in m/s"}
            },
            "required": ["weight", "velocity"]
        })
    }

    fn invoke(&self, params: &Value) -> Result<Value> {
        let p: PowerParams = parse_params(self.kind(), params)?;
        Ok(json!((p.weight * 9.81 * p.velocity) / 1000.0))
    }
}

pub struct CostEstimator;

#[derive(Deserialize)]
struct CostParams {
    weight: f64,
    material: String,
    complexity: f64,
}

impl Tool for CostEstimator {
    fn kind(&self) -> ToolKind {
        ToolKind::CostEstimator
    }

    fn description(&self) -> &str {
        "Estimate manufacturing cost in USD from weight (kg), material and a complexity factor"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "weight": {"type": "number", "description": "Weight in kg"},
                "material": {"type": "string", "description": "Primary material"},
                "complexity": {"type": "number", "description": "Complexity multiplier"}
            },
            "required": ["weight", "material", "complexity"]
        })
    }

    fn invoke(&self, params: &Value) -> Result<Value> {
        let p: CostParams = parse_params(self.kind(), params)?;
        Ok(json!(p.weight * material_cost_per_kg(&p.material) * p.complexity))
    }
}

pub struct FeasibilityChecker;

#[derive(Deserialize)]
struct FeasibilityParams {
    specifications: Map<String, Value>,
}

impl Tool for FeasibilityChecker {
    fn kind(&self) -> ToolKind {
        ToolKind::FeasibilityChecker
    }

    fn description(&self) -> &str {
        "Check design feasibility from a specification map (e.g. weight, cost)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "specifications": {
                    "type": "object",
                    "description": "Design figures such as weight (kg) and cost (USD)",
                    "additionalProperties": true
                }
            },
            "required": ["specifications"]
        })
    }

    fn invoke(&self, params: &Value) -> Result<Value> {
        let p: FeasibilityParams = parse_params(self.kind(), params)?;
        let figure = |key: &str| p.specifications.get(key).and_then(Value::as_f64).unwrap_or(0.0);

        let mut score: f64 = 0.8;
        let mut issues = Vec::new();

        if figure("weight") > 1000.0 {
            score -= 0.2;
            issues.push("Weight too high");
        }
        if figure("cost") > 100_000.0 {
            score -= 0.3;
            issues.push("Cost too high");
        }

        Ok(json!({
            "feasibility_score": score.max(0.0),
            "issues": issues,
            "recommendations": ["Optimize weight", "Reduce cost"],
        }))
    }
}
