use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::{EngineError, EngineResult};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "mistralai/mistral-small-3.2-24b-instruct:free";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model for whichever backend is selected; each has its own default
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub run: RunConfig,
}

/// Knobs of the iteration loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: u32,
    /// Tool calls allowed per decision before a final answer is forced
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    #[serde(default = "default_inference_timeout_secs")]
    pub inference_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_iterations() -> u32 {
    20
}

fn default_stability_threshold() -> u32 {
    3
}

fn default_max_tool_rounds() -> usize {
    5
}

fn default_inference_timeout_secs() -> u64 {
    120
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            stability_threshold: default_stability_threshold(),
            max_tool_rounds: default_max_tool_rounds(),
            inference_timeout_secs: default_inference_timeout_secs(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.max_iterations == 0 {
            return Err(EngineError::Config("max_iterations must be at least 1".into()));
        }
        if self.stability_threshold == 0 {
            return Err(EngineError::Config(
                "stability_threshold must be at least 1".into(),
            ));
        }
        if self.max_tool_rounds == 0 {
            return Err(EngineError::Config("max_tool_rounds must be at least 1".into()));
        }
        if self.inference_timeout_secs == 0 {
            return Err(EngineError::Config(
                "inference_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            base_url: default_base_url(),
            model: None,
            run: RunConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load a TOML file, then let the environment override it.
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config: Config = toml::from_str(&raw)
            .map_err(|e| EngineError::Config(format!("invalid {}: {}", path.display(), e)))?;
        config.apply_env();
        log::info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(key) = std::env::var("OPENROUTER_API_KEY")
            .ok()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        {
            self.openai_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(key);
        }
        if let Ok(model) = std::env::var("UAVCOORD_MODEL") {
            self.model = Some(model);
        }
        if let Ok(url) = std::env::var("UAVCOORD_BASE_URL") {
            self.base_url = url;
        }
        if let Some(n) = env_number("UAVCOORD_MAX_ITERATIONS") {
            self.run.max_iterations = n;
        }
        if let Some(n) = env_number("UAVCOORD_STABILITY_THRESHOLD") {
            self.run.stability_threshold = n;
        }
    }
}

fn env_number(name: &str) -> Option<u32> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a number", name, raw);
            None
        }
    }
}
