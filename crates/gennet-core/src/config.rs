//! GenNet configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GenNetError, Result};

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV: &str = "GENNET_CONFIG";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenNetConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
}

impl GenNetConfig {
    /// Load config: `GENNET_CONFIG` path, else `~/.gennet/config.toml`, else defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GenNetError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| GenNetError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// `PORT` wins over the file, as hosting platforms inject it.
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.gateway.port = port;
        }
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the GenNet home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".gennet")
    }
}

/// Gateway (HTTP server) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8080 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Outbound LLM provider settings. Credentials come from the environment only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Provider tried first when a request names none.
    #[serde(default)]
    pub default_provider: Option<String>,
    /// Pick the preferred provider from the message content when none is named.
    #[serde(default)]
    pub smart_routing: bool,
}

fn default_timeout_secs() -> u64 { 30 }
fn default_max_tokens() -> u32 { 1024 }
fn default_temperature() -> f32 { 0.7 }
fn default_system_prompt() -> String {
    "You are OpenGenNet 2.0, an advanced AI assistant with deep technical expertise.".into()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
            default_provider: None,
            smart_routing: false,
        }
    }
}

/// Knowledge matcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Directory of JSON knowledge files. Unset or empty uses the built-in table.
    #[serde(default)]
    pub data_dir: Option<String>,
    /// Results returned by `/search`.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Snippets spliced into an outbound prompt.
    #[serde(default = "default_context_snippets")]
    pub context_snippets: usize,
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_top_k() -> usize { 5 }
fn default_context_snippets() -> usize { 3 }
fn default_min_score() -> f32 { 1.0 }

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            top_k: default_top_k(),
            context_snippets: default_context_snippets(),
            min_score: default_min_score(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

/// Optional local embedding endpoint (OpenAI-compatible `/embeddings`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Env var holding an API key, if the endpoint needs one.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,
}

fn default_embedding_endpoint() -> String { "http://localhost:11434/v1".into() }
fn default_embedding_model() -> String { "all-minilm".into() }
fn default_min_similarity() -> f32 { 0.35 }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            api_key_env: None,
            min_similarity: default_min_similarity(),
        }
    }
}

/// Chat session memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Idle time after which a session is dropped.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    /// Recent messages replayed to the provider.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn bool_true() -> bool { true }
fn default_max_sessions() -> usize { 1000 }
fn default_max_age_secs() -> u64 { 3600 }
fn default_history_window() -> usize { 8 }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_sessions: default_max_sessions(),
            max_age_secs: default_max_age_secs(),
            history_window: default_history_window(),
        }
    }
}
