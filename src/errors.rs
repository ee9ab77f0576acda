use std::time::Duration;
use thiserror::Error;

use crate::types::{AgentName, Iteration};

/// Failures caught at the agent boundary. A worker that hits one of these
/// commits nothing for the round and is retried on the next one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecisionError {
    #[error("inference call failed: {0}")]
    Inference(String),

    #[error("inference call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed decision: {0}")]
    InvalidOutput(String),

    #[error("tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    #[error("tool '{0}' is not available to this agent")]
    UnknownTool(String),

    #[error("still requesting tools after {0} tool rounds")]
    ToolBudgetExhausted(usize),
}

/// Run-level failures. These end the run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("output for {agent} at iteration {iteration} is already committed")]
    OutputAlreadyCommitted { agent: AgentName, iteration: Iteration },

    #[error("coordinator failed at iteration {iteration}: {source}")]
    Coordinator {
        iteration: Iteration,
        #[source]
        source: DecisionError,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
