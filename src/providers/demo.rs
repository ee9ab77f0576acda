//! Canned replies for a surveillance UAV, used for offline runs.

use super::llm::MockLLMProvider;

pub const BOOTSTRAP_REPLY: &str = r#"{
  "project_complete": false,
  "completion_reason": "Project starting: initial tasks assigned",
  "agent_tasks": [
    {"agent_name": "mission_planner", "task_description": "Define MTOW, range, payload, endurance and altitude for a 50 km surveillance mission with a 2 kg camera"},
    {"agent_name": "aerodynamics", "task_description": "Size the wing for the mission MTOW and a 1.5 h endurance"},
    {"agent_name": "propulsion", "task_description": "Select an electric powerplant for the mission profile"},
    {"agent_name": "structures", "task_description": "Design a light, rain-resistant airframe for the MTOW and wing loads"},
    {"agent_name": "manufacturing", "task_description": "Estimate cost and producibility against the $25,000 budget"}
  ],
  "messages": []
}"#;

pub const COMPLETE_REPLY: &str = r#"{
  "project_complete": true,
  "completion_reason": "All subsystems are consistent and the design meets range, payload, endurance and budget",
  "agent_tasks": [],
  "messages": []
}"#;

pub const MISSION_REPLY: &str = r#"{
  "mtow": 15.0, "range_km": 50.0, "payload_kg": 2.0,
  "endurance_hours": 1.5, "altitude_m": 1500.0,
  "messages": [{"to_agent": "aerodynamics", "content": "MTOW fixed at 15 kg"}]
}"#;

pub const AERODYNAMICS_REPLY: &str = r#"{
  "wing_area_m2": 1.2, "aspect_ratio": 9.0, "airfoil_type": "NACA 4412",
  "lift_to_drag_ratio": 15.0, "stall_speed_ms": 11.0
}"#;

pub const PROPULSION_REPLY: &str = r#"{
  "engine_power_kw": 1.2, "thrust_n": 45.0, "engine_type": "electric",
  "fuel_consumption_rate": 0.8, "engine_weight_kg": 1.4
}"#;

pub const STRUCTURES_REPLY: &str = r#"{
  "fuselage_length_m": 1.6, "wing_spar_material": "carbon_fiber",
  "fuselage_material": "carbon_fiber", "safety_factor": 1.5,
  "structural_weight_kg": 4.2,
  "messages": [{"to_agent": "manufacturing", "content": "Carbon fiber spar and fuselage"}]
}"#;

pub const MANUFACTURING_REPLY: &str = r#"{
  "total_cost_usd": 21000.0, "production_time_hours": 160.0,
  "material_cost_usd": 9000.0, "labor_cost_usd": 12000.0,
  "feasibility_score": 0.85
}"#;

/// Every worker answers with a fixed design; the coordinator bootstraps and
/// accepts the design at its first evaluation.
pub fn demo_provider() -> MockLLMProvider {
    MockLLMProvider::new()
        .on("managing five engineering agents", BOOTSTRAP_REPLY)
        .on("evaluating the collaborative design", COMPLETE_REPLY)
        .on("YOUR ROLE: Mission Planner", MISSION_REPLY)
        .on("YOUR ROLE: Aerodynamics Engineer", AERODYNAMICS_REPLY)
        .on("YOUR ROLE: Propulsion Engineer", PROPULSION_REPLY)
        .on("YOUR ROLE: Structures Engineer", STRUCTURES_REPLY)
        .on("YOUR ROLE: Manufacturing & Cost Engineer", MANUFACTURING_REPLY)
}
