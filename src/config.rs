//! Configuration loading and management.
//!
//! Loads configuration from `./taskmill.toml` (or `$TASKMILL_CONFIG_PATH`).
//! Environment variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

// ── Top-level config ────────────────────────────────────────────

/// Top-level taskmill configuration loaded from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskmillConfig {
    /// Filesystem paths for persistent state.
    pub paths: PathsConfig,
    /// Extraction service configuration.
    pub extractor: ExtractorConfig,
}

impl TaskmillConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// Config file path: `$TASKMILL_CONFIG_PATH` or `./taskmill.toml`.
    /// If the file does not exist, returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_from_file() -> Result<Self> {
        let path = Self::config_path_with(|key| std::env::var(key).ok());
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                let config: TaskmillConfig =
                    toml::from_str(&contents).context("failed to parse config TOML")?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found, using defaults");
                Ok(TaskmillConfig::default())
            }
            Err(e) => Err(anyhow::anyhow!("failed to read config file: {e}")),
        }
    }

    /// Resolve config path using a custom env resolver (for testing).
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(p) = env("TASKMILL_CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("taskmill.toml")
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability.
    fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        // Paths.
        if let Some(v) = env("TASKMILL_DB_PATH") {
            self.paths.database = v;
        }
        if let Some(v) = env("TASKMILL_LOGS_DIR") {
            self.paths.logs_dir = Some(v);
        }

        // Extractor.
        if let Some(v) = env("TASKMILL_PROVIDER") {
            self.extractor.provider = v;
        }
        if let Some(v) = env("TASKMILL_TIMEOUT_SECS") {
            match v.parse() {
                Ok(n) => self.extractor.timeout_seconds = n,
                Err(_) => tracing::warn!(
                    var = "TASKMILL_TIMEOUT_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }

        // Anthropic (env var presence creates the provider entry).
        if let Some(key) = env("TASKMILL_ANTHROPIC_API_KEY") {
            let model = env("TASKMILL_ANTHROPIC_MODEL").unwrap_or_else(|| {
                self.extractor
                    .anthropic
                    .as_ref()
                    .map(|c| c.model.clone())
                    .unwrap_or_else(default_anthropic_model)
            });
            self.extractor.anthropic = Some(AnthropicConfig {
                api_key: key,
                model,
            });
        }

        // OpenAI.
        if let Some(key) = env("TASKMILL_OPENAI_API_KEY") {
            let model = env("TASKMILL_OPENAI_MODEL").unwrap_or_else(|| {
                self.extractor
                    .openai
                    .as_ref()
                    .map(|c| c.model.clone())
                    .unwrap_or_else(default_openai_model)
            });
            let base_url = env("TASKMILL_OPENAI_BASE_URL").unwrap_or_else(|| {
                self.extractor
                    .openai
                    .as_ref()
                    .map(|c| c.base_url.clone())
                    .unwrap_or_else(default_openai_base_url)
            });
            self.extractor.openai = Some(OpenAiConfig {
                base_url,
                api_key: key,
                model,
            });
        }
    }

    /// Parse a TOML string into config (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid config TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: TaskmillConfig =
            toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }
}

// ── Paths config ────────────────────────────────────────────────

/// Filesystem paths for persistent state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// SQLite database path.
    pub database: String,
    /// Directory for rotated JSON log files. When unset, logs go to stderr
    /// only.
    pub logs_dir: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            database: "taskmill.db".to_string(),
            logs_dir: None,
        }
    }
}

// ── Extractor config ────────────────────────────────────────────

/// Extraction service configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Which provider to use: `anthropic` or `openai`.
    pub provider: String,
    /// Max tokens per extraction completion.
    pub max_tokens: u32,
    /// Request timeout for the completion call, in seconds.
    pub timeout_seconds: u64,
    /// Anthropic credentials.
    pub anthropic: Option<AnthropicConfig>,
    /// OpenAI-compatible credentials.
    pub openai: Option<OpenAiConfig>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            max_tokens: 2000,
            timeout_seconds: 60,
            anthropic: None,
            openai: None,
        }
    }
}

/// Anthropic credentials and model selection.
#[derive(Clone, Deserialize)]
pub struct AnthropicConfig {
    /// API key.
    pub api_key: String,
    /// Model name.
    #[serde(default = "default_anthropic_model")]
    pub model: String,
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &"__REDACTED__")
            .field("model", &self.model)
            .finish()
    }
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

/// OpenAI-compatible credentials and model selection.
#[derive(Clone, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    /// API key.
    pub api_key: String,
    /// Model name.
    #[serde(default = "default_openai_model")]
    pub model: String,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"__REDACTED__")
            .field("model", &self.model)
            .finish()
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

// ── Tests ───────────────────────────────────────────────────────
