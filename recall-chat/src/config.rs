//! Configuration for the chat clients

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::policy::PersistencePolicy;

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_MEMORY_API_URL: &str = "http://localhost:8050";

/// Bounds for memories injected into one prompt
pub const MIN_CONTEXT_LIMIT: usize = 3;
pub const MAX_CONTEXT_LIMIT: usize = 5;

/// LLM provider settings, fixed at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Key to send, or a configuration error when none was given
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::config("LLM_API_KEY (or GEMINI_API_KEY) is not set"))
    }
}

/// Where the chat clients keep memories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackend {
    /// A running recall-memory-server
    #[default]
    Http,
    /// SQLite database with local embeddings
    Local,
    /// Process-lifetime store, nothing written to disk
    Ephemeral,
}

/// Per-session orchestrator behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatOptions {
    /// Memories retrieved per turn
    pub context_limit: usize,
    pub persistence: PersistencePolicy,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            context_limit: 3,
            persistence: PersistencePolicy::Always,
        }
    }
}

impl ChatOptions {
    pub fn new(context_limit: usize, persistence: PersistencePolicy) -> Result<Self> {
        if !(MIN_CONTEXT_LIMIT..=MAX_CONTEXT_LIMIT).contains(&context_limit) {
            return Err(Error::config(format!(
                "context limit must be between {MIN_CONTEXT_LIMIT} and {MAX_CONTEXT_LIMIT}, got {context_limit}"
            )));
        }

        Ok(Self {
            context_limit,
            persistence,
        })
    }
}
