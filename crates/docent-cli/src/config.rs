//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use docent_agent::{AssistantConfig, SummaryConfig};

const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for docent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model to use
    pub model: Option<String>,
    /// OpenAI-compatible API base URL
    pub base_url: Option<String>,
    /// API key (alternative to OPENAI_API_KEY)
    pub api_key: Option<String>,
    /// JSON file of documents; the bundled sample corpus when unset
    pub documents: Option<String>,
    /// User id attached to new sessions
    pub user: Option<String>,
    /// Limit for one engine call, 0 for none
    pub engine_timeout_secs: Option<u64>,
    /// Limit for one tool call, 0 for none
    pub tool_timeout_secs: Option<u64>,
    /// Refresh a rolling conversation summary after every turn
    pub summary_enabled: Option<bool>,
    /// Word budget for the rolling summary
    pub summary_max_words: Option<usize>,
}

fn timeout(secs: Option<u64>, default: Option<Duration>) -> Option<Duration> {
    match secs {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => default,
    }
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docent")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("DOCENT_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            model: Some(DEFAULT_MODEL.to_string()),
            engine_timeout_secs: Some(120),
            tool_timeout_secs: Some(30),
            summary_enabled: Some(false),
            summary_max_words: Some(150),
            ..Default::default()
        };

        default_config.save()?;
        Ok(path)
    }

    pub fn model_or_default(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// API key from config, falling back to OPENAI_API_KEY
    pub fn get_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }

    /// Settings for the assistant core
    pub fn assistant_config(&self) -> AssistantConfig {
        let defaults = AssistantConfig::default();
        AssistantConfig {
            engine_timeout: timeout(self.engine_timeout_secs, defaults.engine_timeout),
            tool_timeout: timeout(self.tool_timeout_secs, defaults.tool_timeout),
            summary: SummaryConfig {
                enabled: self.summary_enabled.unwrap_or(defaults.summary.enabled),
                max_words: self.summary_max_words.unwrap_or(defaults.summary.max_words),
            },
            ..defaults
        }
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# docent configuration file
# Place at ~/.config/docent/config.toml (Linux/Mac) or %APPDATA%\docent\config.toml (Windows)

# Model to use
model = "gpt-4o-mini"

# OpenAI-compatible endpoint (optional)
# base_url = "http://localhost:11434/v1"

# API key (optional - OPENAI_API_KEY is used when unset)
# api_key = "sk-..."

# JSON array of documents (optional - the bundled sample corpus is used when unset)
# documents = "~/docs/corpus.json"

# User id for new sessions
# user = "analyst"

# Timeouts in seconds (0 disables)
engine_timeout_secs = 120
tool_timeout_secs = 30

# Rolling conversation summary
summary_enabled = false
summary_max_words = 150
"#
}
