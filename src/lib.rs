pub mod config;
pub mod engine;
pub mod errors;
pub mod providers;
pub mod report;
pub mod roles;
pub mod storage;
pub mod tools;
pub mod types;

pub use config::{Config, RunConfig};
pub use engine::RoundScheduler;
pub use errors::{DecisionError, EngineError, EngineResult};
pub use storage::{RunState, Termination};
pub use types::*;
