//! Configuration management for StoryMagic
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Precedence is CLI flag, then environment, then file, then default.

use crate::cli::{Cli, Commands};
use crate::error::{Result, StoryMagicError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for StoryMagic
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Text model provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Story generation parameters
    #[serde(default)]
    pub story: StoryConfig,
    /// Illustration settings
    #[serde(default)]
    pub illustrations: IllustrationConfig,
    /// Hosted database settings; memory-only when incomplete
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served for non-API paths
    #[serde(default = "default_public_dir")]
    pub public_dir: String,

    /// Prometheus exporter port (only used with the `prometheus` feature)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_metrics_port() -> u16 {
    9000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
            metrics_port: default_metrics_port(),
        }
    }
}

/// Provider configuration
///
/// Specifies which text model provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use (`openai` or `ollama`)
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// OpenAI-compatible provider configuration
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
}

fn default_provider_type() -> String {
    "openai".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

/// OpenAI-compatible chat completions configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL; `/chat/completions` is appended
    #[serde(default = "default_openai_api_base")]
    pub api_base: String,

    /// API key; requests fail fast when missing
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_openai_model")]
    pub model: String,

    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_provider_timeout() -> u64 {
    120
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: default_openai_api_base(),
            api_key: None,
            model: default_openai_model(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,

    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

/// Story generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token budget for readers under eight
    #[serde(default = "default_young_reader_max_tokens")]
    pub young_reader_max_tokens: u32,

    /// Token budget for everyone else
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.8
}

fn default_young_reader_max_tokens() -> u32 {
    1200
}

fn default_max_tokens() -> u32 {
    2000
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            young_reader_max_tokens: default_young_reader_max_tokens(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Illustration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IllustrationConfig {
    /// Ask the text provider for SVG scenes; placeholders otherwise
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_max_images")]
    pub max_images: usize,
}

fn default_max_images() -> usize {
    3
}

impl Default for IllustrationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_images: default_max_images(),
        }
    }
}

/// Hosted database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Project URL (e.g. `https://xyz.supabase.co`)
    #[serde(default)]
    pub url: Option<String>,

    /// Anon API key
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_database_timeout")]
    pub timeout_seconds: u64,
}

fn default_database_timeout() -> u64 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_seconds: default_database_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Whether both URL and key are present
    pub fn is_configured(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().map_or(false, |s| !s.trim().is_empty());
        present(&self.url) && present(&self.api_key)
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| StoryMagicError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| StoryMagicError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(value) = port.parse() {
                self.server.port = value;
            } else {
                tracing::warn!("Invalid PORT: {}", port);
            }
        }

        if let Ok(host) = std::env::var("STORYMAGIC_HOST") {
            self.server.host = host;
        }

        if let Ok(dir) = std::env::var("STORYMAGIC_PUBLIC_DIR") {
            self.server.public_dir = dir;
        }

        if let Ok(provider_type) = std::env::var("STORYMAGIC_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.provider.openai.api_key = Some(key);
            }
        }

        if let Ok(model) = std::env::var("STORYMAGIC_OPENAI_MODEL") {
            self.provider.openai.model = model;
        }

        if let Ok(base) = std::env::var("STORYMAGIC_OPENAI_API_BASE") {
            self.provider.openai.api_base = base;
        }

        if let Ok(host) = std::env::var("STORYMAGIC_OLLAMA_HOST") {
            self.provider.ollama.host = host;
        }

        if let Ok(model) = std::env::var("STORYMAGIC_OLLAMA_MODEL") {
            self.provider.ollama.model = model;
        }

        if let Ok(url) = std::env::var("SUPABASE_URL") {
            self.database.url = Some(url);
        }

        if let Ok(key) = std::env::var("SUPABASE_ANON_KEY") {
            self.database.api_key = Some(key);
        }

        if let Ok(enabled) = std::env::var("STORYMAGIC_ILLUSTRATIONS") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.illustrations.enabled = true,
                "0" | "false" | "no" | "off" => self.illustrations.enabled = false,
                _ => tracing::warn!("Invalid STORYMAGIC_ILLUSTRATIONS: {}", enabled),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Commands::Serve {
            host,
            port,
            memory_only,
        } = &cli.command
        {
            if let Some(host) = host {
                self.server.host = host.clone();
            }
            if let Some(port) = port {
                self.server.port = *port;
            }
            if *memory_only {
                tracing::info!("--memory-only given, ignoring database configuration");
                self.database.url = None;
                self.database.api_key = None;
            }
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let valid_providers = ["openai", "ollama"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(StoryMagicError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.server.port == 0 {
            return Err(StoryMagicError::Config("server.port must be greater than 0".to_string()).into());
        }

        if !(0.0..=2.0).contains(&self.story.temperature) {
            return Err(StoryMagicError::Config(
                "story.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if self.story.max_tokens == 0 || self.story.young_reader_max_tokens == 0 {
            return Err(StoryMagicError::Config(
                "story token budgets must be greater than 0".to_string(),
            )
            .into());
        }

        if self.provider.openai.timeout_seconds == 0
            || self.provider.ollama.timeout_seconds == 0
            || self.database.timeout_seconds == 0
        {
            return Err(
                StoryMagicError::Config("timeout_seconds must be greater than 0".to_string())
                    .into(),
            );
        }

        validate_url("provider.openai.api_base", &self.provider.openai.api_base)?;
        validate_url("provider.ollama.host", &self.provider.ollama.host)?;
        if let Some(url) = self.database.url.as_deref().filter(|u| !u.trim().is_empty()) {
            validate_url("database.url", url)?;
        }

        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| StoryMagicError::Config(format!("{} is not a valid URL: {}", field, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(StoryMagicError::Config(format!(
            "{} must use http or https, got {}",
            field,
            parsed.scheme()
        ))
        .into());
    }
    Ok(())
}
