use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AgentName, Iteration};

/// Outgoing message as produced by a decision. The recipient is free text
/// until the dispatcher resolves it against the registered agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub to_agent: String,
    pub content: String,
}

impl AgentMessage {
    pub fn new(to_agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            to_agent: to_agent.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub from_agent: AgentName,
    pub to_agent: AgentName,
    pub content: String,
    pub iteration: Iteration,
    pub timestamp: DateTime<Utc>,
}

impl StoredMessage {
    pub fn new(
        from_agent: AgentName,
        to_agent: AgentName,
        content: String,
        iteration: Iteration,
    ) -> Self {
        Self {
            from_agent,
            to_agent,
            content,
            iteration,
            timestamp: Utc::now(),
        }
    }
}
