//! Trinity configuration

use crate::error::{Result, TrinityError, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrinityConfig {
    /// LLM provider settings
    pub llm: LlmSettings,

    /// RefleXion loop settings
    pub reflexion: ReflexionSettings,

    /// Logging settings
    pub logging: LoggingSettings,
}

impl TrinityConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.llm.provider = provider;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.reflexion.max_iterations = max_iterations;
        self
    }

    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.reflexion.quality_threshold = threshold;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reflexion.output_dir = Some(dir.into());
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TrinityError::Config(format!("cannot encode configuration: {}", e)))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Reject values the loop cannot run with
    pub fn validate(&self) -> Result<()> {
        self.reflexion.validate()
    }
}

/// Which completion backend to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    OpenRouter,
    /// No network; agents run on heuristics alone
    #[default]
    Offline,
}

impl ProviderKind {
    /// Environment variable holding the API key
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAI => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::OpenRouter => Some("OPENROUTER_API_KEY"),
            ProviderKind::Offline => None,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-5-sonnet-latest",
            ProviderKind::OpenRouter => "openai/gpt-4o-mini",
            ProviderKind::Offline => "offline",
        }
    }
}

/// LLM settings. API keys are read from the environment, never from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: ProviderKind,
    /// Model name; provider default when unset
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub rate_limit_per_minute: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Offline,
            model: None,
            base_url: None,
            temperature: 0.3,
            max_tokens: 2000,
            timeout_secs: 60,
            max_retries: 3,
            rate_limit_per_minute: 60,
        }
    }
}

impl LlmSettings {
    pub fn model_name(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }
}

/// RefleXion loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflexionSettings {
    /// Absolute cap on generation rounds
    pub max_iterations: u32,

    /// Overall score at which generation stops
    pub quality_threshold: f64,

    /// Score delta below which an iteration counts as stagnant
    pub stagnation_threshold: f64,

    /// Consecutive stagnant iterations before the loop gives up
    pub stagnation_limit: u32,

    /// Where history files are written (none: not persisted)
    pub output_dir: Option<PathBuf>,
}

impl Default for ReflexionSettings {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            quality_threshold: 85.0,
            stagnation_threshold: 1.0,
            stagnation_limit: 2,
            output_dir: None,
        }
    }
}

impl ReflexionSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(ValidationError::InvalidIterationBudget(self.max_iterations).into());
        }
        if !(0.0..=100.0).contains(&self.quality_threshold) {
            return Err(ValidationError::InvalidThreshold(self.quality_threshold).into());
        }
        if !(0.0..=100.0).contains(&self.stagnation_threshold) {
            return Err(ValidationError::InvalidThreshold(self.stagnation_threshold).into());
        }
        if self.stagnation_limit == 0 {
            return Err(ValidationError::InvalidStagnationLimit(self.stagnation_limit).into());
        }
        Ok(())
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when RUST_LOG is unset
    pub level: String,

    /// Emit one audit entry per agent call
    pub audit: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            audit: true,
        }
    }
}
