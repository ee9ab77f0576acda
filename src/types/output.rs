use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AgentMessage, Iteration, WorkerRole};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionPlan {
    /// Maximum take-off weight in kg
    pub mtow: f64,
    pub range_km: f64,
    pub payload_kg: f64,
    pub endurance_hours: f64,
    pub altitude_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AerodynamicsDesign {
    pub wing_area_m2: f64,
    pub aspect_ratio: f64,
    pub airfoil_type: String,
    pub lift_to_drag_ratio: f64,
    pub stall_speed_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropulsionDesign {
    pub engine_power_kw: f64,
    pub thrust_n: f64,
    /// electric, turbine or combustion
    pub engine_type: String,
    pub fuel_consumption_rate: f64,
    pub engine_weight_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuresDesign {
    pub fuselage_length_m: f64,
    pub wing_spar_material: String,
    pub fuselage_material: String,
    pub safety_factor: f64,
    pub structural_weight_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufacturingDesign {
    pub total_cost_usd: f64,
    pub production_time_hours: f64,
    pub material_cost_usd: f64,
    pub labor_cost_usd: f64,
    /// Manufacturability in (0, 1]
    pub feasibility_score: f64,
}

/// The engineering fields of a worker output. Equality over this type is the
/// MAINTAIN/UPDATE test: it excludes the iteration stamp and outgoing messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Design {
    MissionPlanner(MissionPlan),
    Aerodynamics(AerodynamicsDesign),
    Propulsion(PropulsionDesign),
    Structures(StructuresDesign),
    Manufacturing(ManufacturingDesign),
}

impl Design {
    pub fn role(&self) -> WorkerRole {
        match self {
            Design::MissionPlanner(_) => WorkerRole::MissionPlanner,
            Design::Aerodynamics(_) => WorkerRole::Aerodynamics,
            Design::Propulsion(_) => WorkerRole::Propulsion,
            Design::Structures(_) => WorkerRole::Structures,
            Design::Manufacturing(_) => WorkerRole::Manufacturing,
        }
    }

    /// Every field must be populated: numbers finite and positive, strings
    /// non-blank.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Design::MissionPlanner(d) => {
                positive("mtow", d.mtow)?;
                positive("range_km", d.range_km)?;
                positive("payload_kg", d.payload_kg)?;
                positive("endurance_hours", d.endurance_hours)?;
                positive("altitude_m", d.altitude_m)
            }
            Design::Aerodynamics(d) => {
                positive("wing_area_m2", d.wing_area_m2)?;
                positive("aspect_ratio", d.aspect_ratio)?;
                non_blank("airfoil_type", &d.airfoil_type)?;
                positive("lift_to_drag_ratio", d.lift_to_drag_ratio)?;
                positive("stall_speed_ms", d.stall_speed_ms)
            }
            Design::Propulsion(d) => {
                positive("engine_power_kw", d.engine_power_kw)?;
                positive("thrust_n", d.thrust_n)?;
                non_blank("engine_type", &d.engine_type)?;
                positive("fuel_consumption_rate", d.fuel_consumption_rate)?;
                positive("engine_weight_kg", d.engine_weight_kg)
            }
            Design::Structures(d) => {
                positive("fuselage_length_m", d.fuselage_length_m)?;
                non_blank("wing_spar_material", &d.wing_spar_material)?;
                non_blank("fuselage_material", &d.fuselage_material)?;
                positive("safety_factor", d.safety_factor)?;
                positive("structural_weight_kg", d.structural_weight_kg)
            }
            Design::Manufacturing(d) => {
                positive("total_cost_usd", d.total_cost_usd)?;
                positive("production_time_hours", d.production_time_hours)?;
                positive("material_cost_usd", d.material_cost_usd)?;
                positive("labor_cost_usd", d.labor_cost_usd)?;
                positive("feasibility_score", d.feasibility_score)?;
                if d.feasibility_score > 1.0 {
                    return Err(format!(
                        "feasibility_score must be at most 1.0, got {}",
                        d.feasibility_score
                    ));
                }
                Ok(())
            }
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Design::MissionPlanner(d) => format!(
                "MTOW={}kg, Range={}km, Payload={}kg, Endurance={}h, Altitude={}m",
                d.mtow, d.range_km, d.payload_kg, d.endurance_hours, d.altitude_m
            ),
            Design::Aerodynamics(d) => format!(
                "Wing={}m², AR={}, Airfoil={}, L/D={}, Stall={}m/s",
                d.wing_area_m2, d.aspect_ratio, d.airfoil_type, d.lift_to_drag_ratio, d.stall_speed_ms
            ),
            Design::Propulsion(d) => format!(
                "{}kW {}, {}N thrust, engine {}kg",
                d.engine_power_kw, d.engine_type, d.thrust_n, d.engine_weight_kg
            ),
            Design::Structures(d) => format!(
                "{}kg structure, spar={}, fuselage={} ({}m), SF={}",
                d.structural_weight_kg,
                d.wing_spar_material,
                d.fuselage_material,
                d.fuselage_length_m,
                d.safety_factor
            ),
            Design::Manufacturing(d) => format!(
                "${} total, {}h production, Feasibility={}",
                d.total_cost_usd, d.production_time_hours, d.feasibility_score
            ),
        }
    }
}

fn positive(field: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{} must be a positive number, got {}", field, value))
    }
}

fn non_blank(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} must not be empty", field))
    } else {
        Ok(())
    }
}

#[derive(Deserialize)]
struct Decision<T> {
    #[serde(flatten)]
    design: T,
    #[serde(default)]
    messages: Vec<AgentMessage>,
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<(T, Vec<AgentMessage>), String> {
    let decision: Decision<T> = serde_json::from_value(value).map_err(|e| e.to_string())?;
    Ok((decision.design, decision.messages))
}

/// A worker's committed answer for one iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub design: Design,
    #[serde(default)]
    pub messages: Vec<AgentMessage>,
    pub iteration: Iteration,
}

impl AgentOutput {
    pub fn new(design: Design, messages: Vec<AgentMessage>, iteration: Iteration) -> Self {
        Self {
            design,
            messages,
            iteration,
        }
    }

    pub fn role(&self) -> WorkerRole {
        self.design.role()
    }

    /// Decode a flat decision object (design fields plus `messages`) for the
    /// given role, then validate it. Any `iteration` in the payload is
    /// ignored; the engine stamps it.
    pub fn from_decision(
        role: WorkerRole,
        value: Value,
        iteration: Iteration,
    ) -> Result<Self, String> {
        let (design, messages) = match role {
            WorkerRole::MissionPlanner => {
                decode(value).map(|(d, m)| (Design::MissionPlanner(d), m))?
            }
            WorkerRole::Aerodynamics => decode(value).map(|(d, m)| (Design::Aerodynamics(d), m))?,
            WorkerRole::Propulsion => decode(value).map(|(d, m)| (Design::Propulsion(d), m))?,
            WorkerRole::Structures => decode(value).map(|(d, m)| (Design::Structures(d), m))?,
            WorkerRole::Manufacturing => {
                decode(value).map(|(d, m)| (Design::Manufacturing(d), m))?
            }
        };
        design.validate()?;
        Ok(Self::new(design, messages, iteration))
    }

    /// Same engineering values as `other`, ignoring iteration and messages.
    pub fn maintains(&self, other: &AgentOutput) -> bool {
        self.design == other.design
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTask {
    pub agent_name: String,
    pub task_description: String,
}

impl AgentTask {
    pub fn new(agent_name: impl Into<String>, task_description: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            task_description: task_description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorOutput {
    pub project_complete: bool,
    pub completion_reason: String,
    /// Assignments for the next round, keyed by agent name.
    #[serde(default)]
    pub agent_tasks: Vec<AgentTask>,
    #[serde(default)]
    pub messages: Vec<AgentMessage>,
    #[serde(default)]
    pub iteration: Iteration,
}

impl CoordinatorOutput {
    pub fn continuation(reason: impl Into<String>, iteration: Iteration) -> Self {
        Self {
            project_complete: false,
            completion_reason: reason.into(),
            agent_tasks: Vec::new(),
            messages: Vec::new(),
            iteration,
        }
    }

    pub fn task_for(&self, role: WorkerRole) -> Option<&str> {
        self.agent_tasks
            .iter()
            .find(|t| t.agent_name.trim() == role.as_str())
            .map(|t| t.task_description.as_str())
    }
}
