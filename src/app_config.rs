use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::language_utils;
use crate::providers::RetryPolicy;
use crate::translation::batch::BatchOptions;
use crate::translation::engine::DEFAULT_CHAT_PROMPT;

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILENAME: &str = "conf.json";

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO), or `auto`
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Sliding window geometry
    #[serde(default)]
    pub batch: BatchConfig,

    /// Dispatch rate limit
    #[serde(default)]
    pub throttle: ThrottleConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation engine type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Self-hosted DeepL bridge
    #[default]
    Deeplx,
    /// Baidu Fanyi
    Baidu,
    /// Google Cloud Translation v2
    Google,
    /// OpenAI-compatible chat completions
    OpenAI,
    /// Local Ollama server
    Ollama,
}

impl EngineKind {
    /// Capitalized engine name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Deeplx => "DeepLX",
            Self::Baidu => "Baidu",
            Self::Google => "Google",
            Self::OpenAI => "OpenAI",
            Self::Ollama => "Ollama",
        }
    }

    /// Lowercase engine identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Deeplx => "deeplx".to_string(),
            Self::Baidu => "baidu".to_string(),
            Self::Google => "google".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }

    /// Whether the engine keeps a conversation across windows
    pub fn is_stateful(&self) -> bool {
        matches!(self, Self::OpenAI | Self::Ollama)
    }

    pub fn all() -> [EngineKind; 5] {
        [Self::Deeplx, Self::Baidu, Self::Google, Self::OpenAI, Self::Ollama]
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for EngineKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "deeplx" => Ok(Self::Deeplx),
            "baidu" => Ok(Self::Baidu),
            "google" => Ok(Self::Google),
            "openai" | "chatgpt" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid engine type: {}", s)),
        }
    }
}

/// Per-engine settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    /// Engine type identifier
    #[serde(rename = "type")]
    pub engine_type: String,

    /// Model name, chat engines only
    #[serde(default = "String::new")]
    pub model: String,

    /// API key (Baidu: app id)
    #[serde(default = "String::new")]
    pub api_key: String,

    /// API secret (Baidu only)
    #[serde(default = "String::new")]
    pub api_secret: String,

    /// Service URL, empty for the engine default
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl EngineConfig {
    /// Engine settings with defaults
    pub fn new(kind: EngineKind) -> Self {
        Self {
            engine_type: kind.to_lowercase_string(),
            model: default_model(kind),
            api_key: String::new(),
            api_secret: String::new(),
            endpoint: default_endpoint(kind),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Engine to use
    #[serde(default)]
    pub engine: EngineKind,

    /// Settings for each engine
    #[serde(default)]
    pub available_engines: Vec<EngineConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all engines
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for chat engines
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for chat engines (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Conversation rounds kept by chat engines
    #[serde(default = "default_context_offset")]
    pub context_offset: usize,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            context_offset: default_context_offset(),
        }
    }
}

/// Sliding window settings
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Lines per request
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Lines repeated from the previous window as context
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Extra attempts for a failed window
    #[serde(default)]
    pub window_retries: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            overlap: default_overlap(),
            window_retries: 0,
        }
    }
}

impl From<BatchConfig> for BatchOptions {
    fn from(config: BatchConfig) -> Self {
        BatchOptions::new(config.block_size, config.overlap).with_window_retries(config.window_retries)
    }
}

/// Token bucket settings, disabled when either value is zero
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThrottleConfig {
    /// Requests allowed in a burst
    #[serde(default)]
    pub permits: u32,

    /// Seconds to regain one request
    #[serde(default)]
    pub interval_secs: u64,
}

impl ThrottleConfig {
    pub fn is_enabled(&self) -> bool {
        self.permits > 0 && self.interval_secs > 0
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "ja".to_string()
}

fn default_target_language() -> String {
    "zh".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500 // doubled on each retry
}

fn default_temperature() -> f32 {
    0.2
}

fn default_context_offset() -> usize {
    10
}

fn default_block_size() -> usize {
    10
}

fn default_overlap() -> usize {
    3
}

fn default_system_prompt() -> String {
    DEFAULT_CHAT_PROMPT.to_string()
}

fn default_endpoint(kind: EngineKind) -> String {
    match kind {
        EngineKind::Deeplx => crate::providers::deeplx::DEFAULT_ENDPOINT,
        EngineKind::Baidu => crate::providers::baidu::DEFAULT_ENDPOINT,
        EngineKind::Google => crate::providers::google::DEFAULT_ENDPOINT,
        EngineKind::OpenAI => crate::providers::openai::DEFAULT_ENDPOINT,
        EngineKind::Ollama => crate::providers::ollama::DEFAULT_ENDPOINT,
    }
    .to_string()
}

fn default_model(kind: EngineKind) -> String {
    match kind {
        EngineKind::OpenAI => "gpt-3.5-turbo".to_string(),
        EngineKind::Ollama => "llama3".to_string(),
        _ => String::new(),
    }
}

/// Per-user config file, `<config dir>/srtt/conf.json`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|dir| dir.join("srtt").join(DEFAULT_CONFIG_FILENAME))
}

/// Pick the config file to use
///
/// The requested path wins when it exists. Otherwise the per-user file is
/// used if present, and the requested path is where defaults get written.
pub fn resolve_config_path(requested: &Path) -> PathBuf {
    if requested.exists() {
        return requested.to_path_buf();
    }
    match user_config_path() {
        Some(user_path) if user_path.exists() => user_path,
        _ => requested.to_path_buf(),
    }
}

impl Config {
    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context(format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).context(format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        language_utils::validate_language_code(&self.source_language)
            .context("Invalid source language")?;
        if language_utils::is_auto(&self.target_language) {
            return Err(anyhow!("Target language cannot be auto-detected"));
        }
        language_utils::validate_language_code(&self.target_language)
            .context("Invalid target language")?;

        // Validate window geometry
        BatchOptions::from(self.batch).validate()?;

        if self.translation.engine.is_stateful() && self.translation.common.context_offset == 0 {
            return Err(anyhow!("context_offset must be at least 1"));
        }

        // Validate credentials
        let engine = self.translation.engine;
        match engine {
            EngineKind::Baidu => {
                if self.translation.get_api_key().is_empty() || self.translation.get_api_secret().is_empty() {
                    return Err(anyhow!("Baidu requires both an app id (api_key) and a secret (api_secret)"));
                }
            }
            EngineKind::Google | EngineKind::OpenAI => {
                if self.translation.get_api_key().is_empty() {
                    return Err(anyhow!("Translation API key is required for {} engine", engine.display_name()));
                }
            }
            EngineKind::Deeplx | EngineKind::Ollama => {}
        }

        // Validate endpoint
        let endpoint = self.translation.get_endpoint();
        let with_scheme = if engine == EngineKind::Ollama && !endpoint.contains("://") {
            format!("http://{}", endpoint)
        } else {
            endpoint.clone()
        };
        Url::parse(&with_scheme).context(format!("Invalid endpoint URL for {}: {}", engine, endpoint))?;

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            batch: BatchConfig::default(),
            throttle: ThrottleConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active engine configuration from the available_engines array
    pub fn get_active_engine_config(&self) -> Option<&EngineConfig> {
        self.get_engine_config(self.engine)
    }

    /// Get a specific engine configuration by type
    pub fn get_engine_config(&self, kind: EngineKind) -> Option<&EngineConfig> {
        let engine_str = kind.to_lowercase_string();
        self.available_engines.iter().find(|e| e.engine_type == engine_str)
    }

    /// Mutable configuration for the active engine, added with defaults when missing
    pub fn active_engine_config_mut(&mut self) -> &mut EngineConfig {
        let engine_str = self.engine.to_lowercase_string();
        let position = match self.available_engines.iter().position(|e| e.engine_type == engine_str) {
            Some(position) => position,
            None => {
                self.available_engines.push(EngineConfig::new(self.engine));
                self.available_engines.len() - 1
            }
        };
        &mut self.available_engines[position]
    }

    /// Get the model for the active engine
    pub fn get_model(&self) -> String {
        match self.get_active_engine_config() {
            Some(engine) if !engine.model.is_empty() => engine.model.clone(),
            _ => default_model(self.engine),
        }
    }

    /// Get the API key for the active engine
    pub fn get_api_key(&self) -> String {
        self.get_active_engine_config()
            .map(|engine| engine.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the API secret for the active engine
    pub fn get_api_secret(&self) -> String {
        self.get_active_engine_config()
            .map(|engine| engine.api_secret.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active engine
    pub fn get_endpoint(&self) -> String {
        match self.get_active_engine_config() {
            Some(engine) if !engine.endpoint.is_empty() => engine.endpoint.clone(),
            _ => default_endpoint(self.engine),
        }
    }

    /// Get the request timeout for the active engine
    pub fn get_timeout(&self) -> Duration {
        let secs = match self.get_active_engine_config() {
            Some(engine) if engine.timeout_secs > 0 => engine.timeout_secs,
            _ => default_timeout_secs(),
        };
        Duration::from_secs(secs)
    }

    /// Transport retry policy from the common settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.common.retry_count, self.common.retry_backoff_ms)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            available_engines: EngineKind::all().into_iter().map(EngineConfig::new).collect(),
            common: TranslationCommonConfig::default(),
        }
    }
}
