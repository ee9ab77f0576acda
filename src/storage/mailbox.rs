use serde::{Deserialize, Serialize};

use crate::types::{Iteration, StoredMessage};

/// Append-only inbox for one agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mailbox {
    messages: Vec<StoredMessage>,
}

impl Mailbox {
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    pub fn add(&mut self, message: StoredMessage) {
        self.messages.push(message);
    }

    /// Messages stamped with exactly `iteration`, in insertion order. Reading
    /// does not consume anything.
    pub fn messages_for(&self, iteration: Iteration) -> impl Iterator<Item = &StoredMessage> + '_ {
        self.messages
            .iter()
            .filter(move |m| m.iteration == iteration)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredMessage> + '_ {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
