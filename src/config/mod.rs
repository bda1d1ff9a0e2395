//! Configuration management for prompt-optimizer
//!
//! Supports configuration via:
//! 1. Config file (~/.config/prompt-optimizer/config.toml)
//! 2. Environment variables (PROMPT_OPTIMIZER_MODEL, PROMPT_OPTIMIZER_STRATEGY, ...)
//! 3. CLI arguments (override file/env settings)

use crate::optimization::StrategyName;
use crate::orchestrator::OrchestratorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("aggressiveness must be 1, 2, or 3 (got {0})")]
    InvalidAggressiveness(u8),

    #[error("{name} out of range: {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Unknown strategy '{0}' (expected conservative, moderate, aggressive or custom)")]
    UnknownStrategy(String),

    #[error("Unknown token counter '{0}' (expected openai, anthropic, gemini or generic)")]
    UnknownCounter(String),

    #[error("Missing dependency for {component}: {remediation}")]
    MissingDependency {
        component: String,
        remediation: String,
    },

    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Optimization settings
    pub optimizer: OptimizerSettings,

    /// Result cache settings
    pub cache: CacheSettings,

    /// Meaning-preservation scoring settings
    pub similarity: SimilaritySettings,
}

/// Optimizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Target model, used for token counting and pricing
    pub model: String,

    /// Strategy to run
    pub strategy: StrategyName,

    /// Minimum similarity before falling back to the conservative strategy
    pub similarity_threshold: f64,

    /// Keywords no analyzer may touch
    pub preserve_keywords: Vec<String>,

    /// Pricing override (USD per 1000 input tokens)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_1k_input: Option<f64>,

    /// Pricing override (USD per 1000 output tokens)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_1k_output: Option<f64>,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            strategy: StrategyName::Moderate,
            similarity_threshold: 0.4,
            preserve_keywords: Vec::new(),
            cost_per_1k_input: None,
            cost_per_1k_output: None,
        }
    }
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Whether optimized prompts are cached
    pub enabled: bool,

    /// Maximum cached entries before LRU eviction
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 1024,
        }
    }
}

/// Similarity settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilaritySettings {
    /// Prefer an embedding backend when one is wired in
    pub use_embeddings: bool,
}

impl Config {
    /// Get default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prompt-optimizer")
            .join("config.toml")
    }

    /// Load config from default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path())
    }

    /// Load config from specific path
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default().with_env_overrides());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config.with_env_overrides())
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("PROMPT_OPTIMIZER_MODEL") {
            self.optimizer.model = model;
        }

        if let Ok(strategy) = std::env::var("PROMPT_OPTIMIZER_STRATEGY") {
            match strategy.parse() {
                Ok(parsed) => self.optimizer.strategy = parsed,
                Err(e) => warn!("Ignoring PROMPT_OPTIMIZER_STRATEGY: {}", e),
            }
        }

        if let Ok(threshold) = std::env::var("PROMPT_OPTIMIZER_THRESHOLD") {
            match threshold.parse() {
                Ok(parsed) => self.optimizer.similarity_threshold = parsed,
                Err(_) => warn!("Ignoring unparsable PROMPT_OPTIMIZER_THRESHOLD: {}", threshold),
            }
        }

        self
    }

    /// Save config to default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path())
    }

    /// Save config to specific path
    pub fn save_to(&self, path: PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.optimizer.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold {
                name: "similarity_threshold",
                value: threshold,
            });
        }

        Ok(())
    }

    /// Build the orchestrator configuration described by this file
    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            model: self.optimizer.model.clone(),
            strategy: self.optimizer.strategy,
            cost_per_1k_input: self.optimizer.cost_per_1k_input,
            cost_per_1k_output: self.optimizer.cost_per_1k_output,
            preserve_keywords: self.optimizer.preserve_keywords.clone(),
            similarity_threshold: self.optimizer.similarity_threshold,
            cache_enabled: self.cache.enabled,
            cache_capacity: self.cache.capacity,
            counter: None,
        }
    }

    /// Generate example config content
    pub fn example() -> String {
        let example = Config::default();
        toml::to_string_pretty(&example).unwrap_or_default()
    }
}

/// Builder for creating Config programmatically
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.optimizer.model = model.into();
        self
    }

    pub fn strategy(mut self, strategy: StrategyName) -> Self {
        self.config.optimizer.strategy = strategy;
        self
    }

    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.config.optimizer.similarity_threshold = threshold;
        self
    }

    pub fn preserve_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.config.optimizer.preserve_keywords.push(keyword.into());
        self
    }

    pub fn pricing(mut self, cost_per_1k_input: f64, cost_per_1k_output: f64) -> Self {
        self.config.optimizer.cost_per_1k_input = Some(cost_per_1k_input);
        self.config.optimizer.cost_per_1k_output = Some(cost_per_1k_output);
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache.capacity = capacity;
        self
    }

    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.config.cache.enabled = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.optimizer.model, "gpt-4o");
        assert_eq!(config.optimizer.strategy, StrategyName::Moderate);
        assert_eq!(config.cache.capacity, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .model("claude-sonnet-4-20250514")
            .strategy(StrategyName::Aggressive)
            .preserve_keyword("API")
            .cache_capacity(8)
            .build();

        assert_eq!(config.optimizer.model, "claude-sonnet-4-20250514");
        assert_eq!(config.optimizer.strategy, StrategyName::Aggressive);
        assert_eq!(config.optimizer.preserve_keywords, vec!["API".to_string()]);

        let orchestrator = config.to_orchestrator_config();
        assert_eq!(orchestrator.cache_capacity, 8);
        assert_eq!(orchestrator.strategy, StrategyName::Aggressive);
    }

    #[test]
    fn test_validate_rejects_threshold() {
        let config = ConfigBuilder::new().similarity_threshold(1.5).build();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_example_config() {
        let example = Config::example();
        assert!(example.contains("[optimizer]"));
        assert!(example.contains("[cache]"));
        assert!(example.contains("strategy = \"moderate\""));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = ConfigBuilder::new()
            .model("gemini-2.0-flash")
            .strategy(StrategyName::Conservative)
            .pricing(0.01, 0.03)
            .build();
        config.save_to(path.clone()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let loaded: Config = toml::from_str(&raw).unwrap();
        assert_eq!(loaded.optimizer.model, "gemini-2.0-flash");
        assert_eq!(loaded.optimizer.strategy, StrategyName::Conservative);
        assert_eq!(loaded.optimizer.cost_per_1k_input, Some(0.01));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded: Config = toml::from_str("[cache]\ncapacity = 3\n").unwrap();
        assert_eq!(loaded.cache.capacity, 3);
        assert!(loaded.cache.enabled);
        assert_eq!(loaded.optimizer.model, "gpt-4o");
    }
}
