pub mod context;
pub mod coordinator;
pub mod executor;
pub mod scheduler;
pub mod stability;
pub mod worker;

pub use coordinator::Coordinator;
pub use executor::{AgentExecutor, Decision, ExecutorConfig};
pub use scheduler::RoundScheduler;
pub use stability::StabilityDetector;
pub use worker::{TurnResult, WorkerAgent, WorkerOutcome};
