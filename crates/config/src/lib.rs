//! Configuration loading, validation, and management for Deckhand.
//!
//! Loads configuration from `~/.deckhand/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup;
//! nothing is re-read while the service runs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.deckhand/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Conversation driver settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Language-model API settings
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Presentation and sharing API settings
    #[serde(default)]
    pub google: GoogleConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model identifier sent to the Messages API
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on model calls per generation request
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Token budget per model call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".into()
}
fn default_max_iterations() -> u32 {
    20
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_temperature() -> f32 {
    0.7
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_iterations: default_max_iterations(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the API base URL (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// OAuth access token with the presentations and drive scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Existing presentation to clear and reuse instead of creating a new one.
    ///
    /// Every request resets this same deck, so concurrent generations
    /// overwrite each other. Only set it for single-user deployments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_presentation_id: Option<String>,

    #[serde(default = "default_slides_base_url")]
    pub slides_base_url: String,

    #[serde(default = "default_drive_base_url")]
    pub drive_base_url: String,

    #[serde(default = "default_google_timeout")]
    pub timeout_secs: u64,
}

fn default_slides_base_url() -> String {
    "https://slides.googleapis.com".into()
}
fn default_drive_base_url() -> String {
    "https://www.googleapis.com".into()
}
fn default_google_timeout() -> u64 {
    60
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            template_presentation_id: None,
            slides_base_url: default_slides_base_url(),
            drive_base_url: default_drive_base_url(),
            timeout_secs: default_google_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed to call the API from a browser
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Deployed frontend origin, appended to `allowed_origins`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_url: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}
fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".into(),
        "http://127.0.0.1:5173".into(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            frontend_url: None,
        }
    }
}

impl ServerConfig {
    /// Allowed origins plus the frontend URL, deduplicated.
    pub fn cors_origins(&self) -> Vec<String> {
        let mut origins = self.allowed_origins.clone();
        if let Some(url) = &self.frontend_url {
            let url = url.trim().trim_end_matches('/').to_string();
            if !url.is_empty() && !origins.contains(&url) {
                origins.push(url);
            }
        }
        origins
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("access_token", &redact(&self.access_token))
            .field("template_presentation_id", &self.template_presentation_id)
            .field("slides_base_url", &self.slides_base_url)
            .field("drive_base_url", &self.drive_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.deckhand/config.toml).
    ///
    /// Environment variables override file values:
    /// - `ANTHROPIC_API_KEY`
    /// - `DECKHAND_MODEL` (or `AGENT_MODEL`)
    /// - `AGENT_MAX_ITERATIONS`
    /// - `GOOGLE_ACCESS_TOKEN`
    /// - `DEFAULT_PRESENTATION_ID`
    /// - `FRONTEND_URL`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply process environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.anthropic.api_key = Some(key);
        }
        if let Some(model) = get("DECKHAND_MODEL").or_else(|| get("AGENT_MODEL")) {
            self.agent.model = model;
        }
        if let Some(raw) = get("AGENT_MAX_ITERATIONS") {
            self.agent.max_iterations = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "AGENT_MAX_ITERATIONS must be a positive integer, got '{raw}'"
                ))
            })?;
        }
        if let Some(token) = get("GOOGLE_ACCESS_TOKEN") {
            self.google.access_token = Some(token);
        }
        if let Some(id) = get("DEFAULT_PRESENTATION_ID") {
            self.google.template_presentation_id = Some(id);
        }
        if let Some(url) = get("FRONTEND_URL") {
            self.server.frontend_url = Some(url);
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".deckhand")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        // The Messages API rejects anything outside 0.0..=1.0.
        if !(0.0..=1.0).contains(&self.agent.temperature) {
            return Err(ConfigError::ValidationError(
                "agent.temperature must be between 0.0 and 1.0".into(),
            ));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }
        if self.agent.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tokens must be at least 1".into(),
            ));
        }
        if self.agent.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "agent.model must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Human-readable list of missing credentials; empty when ready to serve.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.anthropic.api_key.is_none() {
            missing.push("ANTHROPIC_API_KEY environment variable is required");
        }
        if self.google.access_token.is_none() {
            missing.push("GOOGLE_ACCESS_TOKEN environment variable is required");
        }
        missing
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
