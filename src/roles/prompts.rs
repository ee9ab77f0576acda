use crate::types::WorkerRole;

const TEAM_CONTEXT: &str = r#"You are part of a collaborative UAV design team of five engineering agents.

TEAM:
- mission_planner: mission requirements and MTOW
- aerodynamics: wing geometry, lift/drag, flight performance
- propulsion: engine type, power, fuel consumption, engine weight
- structures: fuselage and wing structure, materials, structural weight
- manufacturing: production feasibility and cost

DEPENDENCIES:
aerodynamics and propulsion need mission_planner; structures needs
mission_planner and aerodynamics; manufacturing needs structures.

Other agents can read your output directly. Only send messages when another
agent needs to act on something, and only to agents you may talk to.

UPDATE your values when requirements, dependencies or feedback demand it.
MAINTAIN them, exactly, when they still meet requirements."#;

const RESPONSE_FORMAT: &str = r#"RESPONSE FORMAT:
To use a tool, reply with exactly one JSON object:
{"tool": "<tool name>", "params": {...}}

To finish, reply with one JSON object containing every output field and an
optional "messages" list: [{"to_agent": "<agent>", "content": "<text>"}]."#;

pub fn role_brief(role: WorkerRole) -> &'static str {
    match role {
        WorkerRole::MissionPlanner => {
            "YOUR ROLE: Mission Planner. You set the baseline every other subsystem depends on; \
             your MTOW drives wing sizing, power needs and structural loads."
        }
        WorkerRole::Aerodynamics => {
            "YOUR ROLE: Aerodynamics Engineer. Your wing design sets structural loads and \
             power requirements."
        }
        WorkerRole::Propulsion => {
            "YOUR ROLE: Propulsion Engineer. Size the powerplant for the mission and the \
             aerodynamic design."
        }
        WorkerRole::Structures => {
            "YOUR ROLE: Structures Engineer. Design fuselage and wing structure for the \
             MTOW and wing loads, with an adequate safety factor."
        }
        WorkerRole::Manufacturing => {
            "YOUR ROLE: Manufacturing & Cost Engineer. Judge producibility and cost of the \
             structural design."
        }
    }
}

pub fn output_fields(role: WorkerRole) -> &'static str {
    match role {
        WorkerRole::MissionPlanner => {
            "mtow (kg), range_km, payload_kg, endurance_hours, altitude_m"
        }
        WorkerRole::Aerodynamics => {
            "wing_area_m2, aspect_ratio, airfoil_type (string), lift_to_drag_ratio, stall_speed_ms"
        }
        WorkerRole::Propulsion => {
            "engine_power_kw, thrust_n, engine_type (electric/turbine/combustion), \
             fuel_consumption_rate, engine_weight_kg"
        }
        WorkerRole::Structures => {
            "fuselage_length_m, wing_spar_material (string), fuselage_material (string), \
             safety_factor, structural_weight_kg"
        }
        WorkerRole::Manufacturing => {
            "total_cost_usd, production_time_hours, material_cost_usd, labor_cost_usd, \
             feasibility_score (0-1)"
        }
    }
}

pub fn worker_system_prompt(role: WorkerRole, iteration: u32, tool_schemas: &str) -> String {
    let peers: Vec<&str> = role.peers().iter().map(|p| p.as_str()).collect();
    format!(
        "{}\n\n{}\n\nYou may message: {}\nCurrent iteration: {}\n\nOUTPUT FIELDS (all required, numbers positive): {}\n\nTOOLS:\n{}\n\n{}",
        TEAM_CONTEXT,
        role_brief(role),
        peers.join(", "),
        iteration,
        output_fields(role),
        tool_schemas,
        RESPONSE_FORMAT
    )
}

pub const COORDINATOR_INITIAL_SYSTEM: &str = r#"You are the UAV Design Project Coordinator managing five engineering agents:
mission_planner, aerodynamics, propulsion, structures, manufacturing.

Break the requirements into one specific task per agent.

Reply with one JSON object:
{"project_complete": false,
 "completion_reason": "<why the project is starting>",
 "agent_tasks": [{"agent_name": "<agent>", "task_description": "<task>"}],
 "messages": []}"#;

pub const COORDINATOR_EVALUATION_SYSTEM: &str = r#"You are the UAV Design Project Coordinator evaluating the collaborative design.

The agents have stopped changing their outputs. Decide whether the design is
complete: consistent across subsystems and meeting the requirements.

If it is not complete, give targeted tasks for the agents that must change and,
if useful, messages to them.

Reply with one JSON object:
{"project_complete": true|false,
 "completion_reason": "<detailed reason>",
 "agent_tasks": [{"agent_name": "<agent>", "task_description": "<task>"}],
 "messages": [{"to_agent": "<agent>", "content": "<text>"}]}"#;

pub fn coordinator_initial_message(requirements: &str) -> String {
    format!(
        "PROJECT REQUIREMENTS:\n{}\n\nAssign the initial task for every agent.",
        requirements.trim()
    )
}

pub fn coordinator_evaluation_message(
    requirements: &str,
    iteration: u32,
    is_stable: bool,
    latest_outputs: &str,
) -> String {
    format!(
        "PROJECT REQUIREMENTS:\n{}\n\nITERATION: {}\nSTABLE: {}\n\nLATEST AGENT OUTPUTS:\n{}",
        requirements.trim(),
        iteration,
        is_stable,
        latest_outputs
    )
}
