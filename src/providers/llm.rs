use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::{Config, DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, messages: Vec<Message>) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    system: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: "claude-3-5-sonnet-20240620".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Keeps the Anthropic default model unless one is configured.
    pub fn from_config(api_key: String, config: &Config) -> Self {
        match &config.model {
            Some(model) => Self::new(api_key).with_model(model.clone()),
            None => Self::new(api_key),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let system_msg = messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.clone());

        let api_messages: Vec<AnthropicMessage> = messages
            .into_iter()
            .filter(|m| m.role != "system")
            .map(|m| AnthropicMessage {
                role: m.role,
                content: m.content,
            })
            .collect();

        let request = AnthropicRequest {
            model: self.model.clone(),
            messages: api_messages,
            max_tokens: 4096,
            system: system_msg,
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            anyhow::bail!("Anthropic API error {}: {}", status, body);
        }

        let result: AnthropicResponse = response.json().await?;
        result
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| anyhow::anyhow!("No content in response"))
    }
}

/// Any OpenAI-compatible chat completions endpoint (OpenAI, OpenRouter, ...).
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

impl OpenAIProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: "gpt-4o".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(api_key: String, config: &Config) -> Self {
        Self::new(api_key)
            .with_base_url(config.base_url.clone())
            .with_model(config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()))
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let api_messages: Vec<OpenAIMessage> = messages
            .into_iter()
            .map(|m| OpenAIMessage {
                role: m.role,
                content: m.content,
            })
            .collect();

        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: api_messages,
            max_tokens: Some(4096),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            anyhow::bail!("OpenAI API error {}: {}", status, body);
        }

        let result: OpenAIResponse = response.json().await?;
        result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("No choices in response"))
    }
}

#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Error(String),
    /// Sleep, then answer. Used to exercise timeouts.
    Delayed(Duration, String),
}

struct MockRule {
    needle: String,
    replies: Vec<MockReply>,
    served: AtomicUsize,
}

/// Deterministic provider for tests and offline runs. Each rule matches on a
/// substring of the system prompt and serves its replies in order, repeating
/// the last one once the sequence is used up.
pub struct MockLLMProvider {
    rules: Vec<MockRule>,
    default: MockReply,
    calls: AtomicUsize,
}

impl MockLLMProvider {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default: MockReply::Error("no scripted reply".to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_response(response: String) -> Self {
        Self {
            default: MockReply::Text(response),
            ..Self::new()
        }
    }

    pub fn on(self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.on_sequence(needle, vec![MockReply::Text(response.into())])
    }

    pub fn on_sequence(mut self, needle: impl Into<String>, replies: Vec<MockReply>) -> Self {
        self.rules.push(MockRule {
            needle: needle.into(),
            replies,
            served: AtomicUsize::new(0),
        });
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Replies served so far by the rule registered under `needle`.
    pub fn calls_for(&self, needle: &str) -> usize {
        self.rules
            .iter()
            .filter(|r| r.needle == needle)
            .map(|r| r.served.load(Ordering::SeqCst))
            .sum()
    }

    fn pick(&self, system: &str) -> MockReply {
        for rule in &self.rules {
            if rule.replies.is_empty() || !system.contains(&rule.needle) {
                continue;
            }
            let n = rule.served.fetch_add(1, Ordering::SeqCst);
            let idx = n.min(rule.replies.len() - 1);
            return rule.replies[idx].clone();
        }
        self.default.clone()
    }
}

impl Default for MockLLMProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMProvider for MockLLMProvider {
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let system = messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        match self.pick(system) {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(err) => anyhow::bail!(err),
            MockReply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
        }
    }
}

/// Serves a fixed queue of replies regardless of prompt, recording every
/// conversation it was sent.
pub struct ScriptedLLMProvider {
    replies: Mutex<VecDeque<MockReply>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLLMProvider {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn texts<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|r| MockReply::Text(r.into())).collect())
    }

    pub fn conversations(&self) -> Vec<Vec<Message>> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LLMProvider for ScriptedLLMProvider {
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(messages);
        }
        let next = self
            .replies
            .lock()
            .map_err(|_| anyhow::anyhow!("script lock poisoned"))?
            .pop_front();

        match next {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error(err)) => anyhow::bail!(err),
            Some(MockReply::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            None => anyhow::bail!("script exhausted"),
        }
    }
}
