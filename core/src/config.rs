//! TOML Configuration File Support
//!
//! Configuration is read from `$XDG_CONFIG_HOME/kaiwa/kaiwa.toml`
//! (typically `~/.config/kaiwa/kaiwa.toml`).
//!
//! # Configuration Priority
//!
//! Highest first:
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [provider]
//! kind = "ollama"
//! model = "llama3"
//! host = "localhost"
//! port = 11434
//!
//! [reveal]
//! interval_ms = 30
//!
//! [tokenizer]
//! dictionary_path = "/usr/share/kaiwa/dictionary.tsv"
//!
//! [storage]
//! path = "/home/me/.local/share/kaiwa/store.json"
//!
//! [prompt]
//! base = "You are a patient Japanese tutor."
//!
//! [security]
//! max_input_length = 4000
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{BackendConfig, DEFAULT_OLLAMA_MODEL, DEFAULT_OPENAI_MODEL};
use crate::prompt::DEFAULT_BASE_PROMPT;
use crate::validation::{InputLimits, DEFAULT_MAX_INPUT_LENGTH};

/// Default delay between revealed characters
pub const DEFAULT_REVEAL_INTERVAL_MS: u64 = 30;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// The selected provider needs an API key that is not set
    #[error("The {0} provider needs an API key")]
    MissingApiKey(ProviderKind),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Chat provider selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible API
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::ValidationError(format!(
                "unknown provider '{other}' (expected 'openai' or 'ollama')"
            ))),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Provider section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderToml {
    /// `openai` or `ollama`
    pub kind: Option<ProviderKind>,

    /// Chat model
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible server
    pub base_url: Option<String>,

    /// Ollama host
    pub host: Option<String>,

    /// Ollama port
    pub port: Option<u16>,
}

/// Reveal section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealToml {
    /// Delay between revealed characters in milliseconds
    pub interval_ms: Option<u64>,
}

/// Tokenizer section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerToml {
    /// Custom `surface<TAB>reading` dictionary used instead of IPADIC
    pub dictionary_path: Option<PathBuf>,
}

/// Storage section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageToml {
    /// Path to the JSON store
    pub path: Option<PathBuf>,
}

/// Prompt section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptToml {
    /// Base instruction replacing the default persona
    pub base: Option<String>,
}

/// Security section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityToml {
    /// Maximum input length in characters
    pub max_input_length: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KaiwaToml {
    /// Provider configuration section
    pub provider: ProviderToml,

    /// Reveal configuration section
    pub reveal: RevealToml,

    /// Tokenizer configuration section
    pub tokenizer: TokenizerToml,

    /// Storage configuration section
    pub storage: StorageToml,

    /// Prompt configuration section
    pub prompt: PromptToml,

    /// Security configuration section
    pub security: SecurityToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration
#[derive(Clone, Debug)]
pub struct KaiwaConfig {
    /// Chat provider
    pub provider: ProviderKind,

    /// Chat model; provider default when unset
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible server
    pub base_url: Option<String>,

    /// Ollama host
    pub ollama_host: String,

    /// Ollama port
    pub ollama_port: u16,

    /// Delay between revealed characters
    pub reveal_interval: Duration,

    /// Custom reading dictionary; the embedded IPADIC tokenizer is used without one
    pub dictionary_path: Option<PathBuf>,

    /// JSON store location
    pub store_path: PathBuf,

    /// Base instruction
    pub base_prompt: String,

    /// Maximum input length in characters
    pub max_input_length: usize,

    /// Whether to fetch WaniKani progress
    pub vocabulary_enabled: bool,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for KaiwaConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            base_url: None,
            ollama_host: "localhost".to_string(),
            ollama_port: 11434,
            reveal_interval: Duration::from_millis(DEFAULT_REVEAL_INTERVAL_MS),
            dictionary_path: None,
            store_path: default_store_path(),
            base_prompt: DEFAULT_BASE_PROMPT.to_string(),
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
            vocabulary_enabled: true,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl KaiwaConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Model to request, falling back to the provider default
    #[must_use]
    pub fn effective_model(&self) -> &str {
        match (&self.model, self.provider) {
            (Some(model), _) => model,
            (None, ProviderKind::OpenAi) => DEFAULT_OPENAI_MODEL,
            (None, ProviderKind::Ollama) => DEFAULT_OLLAMA_MODEL,
        }
    }

    /// Input limits for the validator
    #[must_use]
    pub fn input_limits(&self) -> InputLimits {
        InputLimits {
            max_input_length: self.max_input_length,
        }
    }

    /// Backend configuration for the selected provider
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] when OpenAI is selected and no
    /// key is available.
    pub fn backend_config(&self, api_key: Option<&str>) -> Result<BackendConfig, ConfigError> {
        let model = self.effective_model().to_string();
        match self.provider {
            ProviderKind::Ollama => Ok(BackendConfig::ollama(
                self.ollama_host.clone(),
                self.ollama_port,
                model,
            )),
            ProviderKind::OpenAi => {
                let api_key = api_key
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .ok_or(ConfigError::MissingApiKey(ProviderKind::OpenAi))?;
                Ok(BackendConfig::OpenAi {
                    api_key: api_key.to_string(),
                    base_url: self.base_url.clone(),
                    model,
                })
            }
        }
    }

    /// Check values that would make the tutor unusable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reveal_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "reveal interval must be greater than zero".to_string(),
            ));
        }
        if self.max_input_length == 0 {
            return Err(ConfigError::ValidationError(
                "max_input_length must be greater than zero".to_string(),
            ));
        }
        if self.base_prompt.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "base prompt must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/kaiwa/kaiwa.toml` or
/// `~/.config/kaiwa/kaiwa.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("kaiwa").join("kaiwa.toml"))
}

/// Get the default store path
///
/// `$XDG_DATA_HOME/kaiwa/store.json`, or `kaiwa-store.json` in the working
/// directory when no data directory is known.
#[must_use]
pub fn default_store_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("kaiwa-store.json"),
        |p| p.join("kaiwa").join("store.json"),
    )
}

/// Load configuration from the default path and the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<KaiwaConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path and the environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<KaiwaConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration using `env` to look up environment variables
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<KaiwaConfig, ConfigError> {
    let mut config = KaiwaConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: KaiwaToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);

    Ok(config)
}

fn apply_toml_config(config: &mut KaiwaConfig, toml: &KaiwaToml) {
    if let Some(kind) = toml.provider.kind {
        config.provider = kind;
    }
    if toml.provider.model.is_some() {
        config.model.clone_from(&toml.provider.model);
    }
    if toml.provider.base_url.is_some() {
        config.base_url.clone_from(&toml.provider.base_url);
    }
    if let Some(ref host) = toml.provider.host {
        config.ollama_host.clone_from(host);
    }
    if let Some(port) = toml.provider.port {
        config.ollama_port = port;
    }

    if let Some(ms) = toml.reveal.interval_ms {
        config.reveal_interval = Duration::from_millis(ms);
    }

    if toml.tokenizer.dictionary_path.is_some() {
        config.dictionary_path.clone_from(&toml.tokenizer.dictionary_path);
    }

    if let Some(ref path) = toml.storage.path {
        config.store_path.clone_from(path);
    }

    if let Some(ref base) = toml.prompt.base {
        config.base_prompt.clone_from(base);
    }

    if let Some(length) = toml.security.max_input_length {
        config.max_input_length = length;
    }
}

fn apply_env_config(config: &mut KaiwaConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(provider) = env("KAIWA_PROVIDER") {
        match provider.parse::<ProviderKind>() {
            Ok(kind) => {
                config.provider = kind;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring KAIWA_PROVIDER"),
        }
    }
    if let Some(model) = env("KAIWA_MODEL") {
        config.model = Some(model);
        config.source = ConfigSource::Env;
    }
    if let Some(interval) = env("KAIWA_REVEAL_INTERVAL_MS") {
        if let Ok(ms) = interval.parse::<u64>() {
            config.reveal_interval = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(path) = env("KAIWA_DICTIONARY") {
        config.dictionary_path = Some(PathBuf::from(path));
        config.source = ConfigSource::Env;
    }
    if let Some(path) = env("KAIWA_STORE") {
        config.store_path = PathBuf::from(path);
        config.source = ConfigSource::Env;
    }
    if let Some(host) = env("OLLAMA_HOST") {
        config.ollama_host = host;
        config.source = ConfigSource::Env;
    }
    if let Some(port) = env("OLLAMA_PORT") {
        if let Ok(p) = port.parse::<u16>() {
            config.ollama_port = p;
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Command-line overrides, applied after [`load_config`]
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Provider override
    pub provider: Option<ProviderKind>,

    /// Model override
    pub model: Option<String>,

    /// Dictionary override
    pub dictionary_path: Option<PathBuf>,

    /// Store path override
    pub store_path: Option<PathBuf>,

    /// Reveal interval override (milliseconds)
    pub reveal_interval_ms: Option<u64>,

    /// Disable vocabulary fetching
    pub no_vocabulary: bool,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set provider override
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set model override
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set reveal interval override
    #[must_use]
    pub fn with_reveal_interval_ms(mut self, ms: u64) -> Self {
        self.reveal_interval_ms = Some(ms);
        self
    }

    fn is_empty(&self) -> bool {
        self.provider.is_none()
            && self.model.is_none()
            && self.dictionary_path.is_none()
            && self.store_path.is_none()
            && self.reveal_interval_ms.is_none()
            && !self.no_vocabulary
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut KaiwaConfig) {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }

        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(ref model) = self.model {
            config.model = Some(model.clone());
        }
        if let Some(ref path) = self.dictionary_path {
            config.dictionary_path = Some(path.clone());
        }
        if let Some(ref path) = self.store_path {
            config.store_path.clone_from(path);
        }
        if let Some(ms) = self.reveal_interval_ms {
            config.reveal_interval = Duration::from_millis(ms);
        }
        if self.no_vocabulary {
            config.vocabulary_enabled = false;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
