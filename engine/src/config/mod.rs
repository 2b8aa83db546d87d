//! Configuration management
//!
//! This module handles loading, validation, and management of the triage
//! configuration. Configuration is stored in TOML format at
//! ~/.triage/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **llm**: External model settings (endpoint, model, limits, timeout)
//! - **history**: Conversation log backend
//! - **server**: HTTP bind address and allowed CORS origins
//!
//! The model credential is never stored here; see [`crate::secrets`].
//!
//! # Examples
//!
//! ```no_run
//! use triage_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Model: {}", config.llm.openai.model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
///
/// Every section is optional in the file; missing sections take defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// External model configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Conversation log configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// External model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Consult the external model at all. When false, every request takes
    /// the fallback path even if a credential is present.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Upper bound on a single advisor call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// OpenAI-compatible provider settings
    #[serde(default)]
    pub openai: OpenAIConfig,
}

/// OpenAI-compatible provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for the chat completions API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Output ceiling sent as `max_tokens`
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    // Note: API key comes from OPENAI_API_KEY or the OS keychain
}

/// Conversation log backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    /// `conversations.json` in the data directory
    Json,
    /// SQLite database in the data directory
    Sqlite,
    /// Process-lifetime only
    Memory,
}

impl HistoryBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryBackend::Json => "json",
            HistoryBackend::Sqlite => "sqlite",
            HistoryBackend::Memory => "memory",
        }
    }

    /// File name used when `history.file_name` is not set
    pub fn default_file_name(&self) -> &'static str {
        match self {
            HistoryBackend::Json | HistoryBackend::Memory => "conversations.json",
            HistoryBackend::Sqlite => "conversations.db",
        }
    }
}

/// Conversation log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Storage backend
    #[serde(default = "default_history_backend")]
    pub backend: HistoryBackend,

    /// File name inside the data directory; defaults per backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.triage")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_temperature() -> f64 {
    0.3
}

fn default_history_backend() -> HistoryBackend {
    HistoryBackend::Json
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: default_timeout_secs(),
            openai: OpenAIConfig::default(),
        }
    }
}

impl LLMConfig {
    /// Advisor call budget as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: default_history_backend(),
            file_name: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.triage/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Serialize before processing so the file keeps the portable ~ path
        let config = Self::default();
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        let mut config = config;
        config.validate_and_process()?;
        Ok(config)
    }

    /// Get the default configuration file path (~/.triage/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".triage").join("config.toml"))
    }

    /// Full path of the conversation log file
    pub fn history_path(&self) -> PathBuf {
        let file_name = self
            .history
            .file_name
            .as_deref()
            .unwrap_or_else(|| self.history.backend.default_file_name());
        self.core.data_dir.join(file_name)
    }

    /// Validate and process configuration
    ///
    /// Validates value ranges, expands ~ in the data directory and creates
    /// it if missing.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(EngineError::Config(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.llm.openai.max_tokens == 0 {
            return Err(EngineError::Config(
                "llm.openai.max_tokens must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.openai.temperature) {
            return Err(EngineError::Config(
                "llm.openai.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if matches!(&self.history.file_name, Some(name) if name.trim().is_empty()) {
            return Err(EngineError::Config(
                "history.file_name must not be empty".to_string(),
            ));
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        self.core.data_dir = canonicalize_or_create(&self.core.data_dir)?;

        if !self.core.data_dir.is_dir() {
            return Err(EngineError::Config(format!(
                "Data path is not a directory: {:?}",
                self.core.data_dir
            )));
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Canonicalize path, creating it if it doesn't exist
fn canonicalize_or_create(path: &Path) -> Result<PathBuf, EngineError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            EngineError::Config(format!("Failed to create directory {:?}: {}", path, e))
        })?;
    }

    path.canonicalize()
        .map_err(|e| EngineError::PathCanonicalization(path.to_path_buf(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert!(config.llm.enabled);
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.llm.openai.max_tokens, 300);
        assert_eq!(config.history.backend, HistoryBackend::Json);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.llm.openai.model, deserialized.llm.openai.model);
        assert_eq!(config.history.backend, deserialized.history.backend);
    }

    #[test]
    fn test_history_path_defaults_per_backend() {
        let mut config = Config::default();
        config.core.data_dir = PathBuf::from("/data");
        assert_eq!(config.history_path(), PathBuf::from("/data/conversations.json"));

        config.history.backend = HistoryBackend::Sqlite;
        assert_eq!(config.history_path(), PathBuf::from("/data/conversations.db"));

        config.history.file_name = Some("triage.sqlite".to_string());
        assert_eq!(config.history_path(), PathBuf::from("/data/triage.sqlite"));
    }

    #[test]
    fn test_history_backend_names() {
        assert_eq!(HistoryBackend::Json.as_str(), "json");
        assert_eq!(HistoryBackend::Sqlite.as_str(), "sqlite");
        assert_eq!(HistoryBackend::Memory.as_str(), "memory");
    }
}
