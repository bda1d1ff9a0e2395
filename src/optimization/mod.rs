//! Optimization strategies for reducing token consumption

mod strategies;

pub use strategies::{OptimizationStrategy, Pipeline};

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named strategies selectable from config and the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyName {
    /// Whitespace and filler phrases only
    Conservative,
    /// Markdown compression, filler words, verbose rewrites, deduplication
    #[default]
    Moderate,
    /// Everything, including markdown stripping and pronoun compression
    Aggressive,
    /// Caller-supplied analyzer list
    Custom,
}

impl StrategyName {
    pub const BUILT_IN: [StrategyName; 3] = [
        StrategyName::Conservative,
        StrategyName::Moderate,
        StrategyName::Aggressive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyName::Conservative => "conservative",
            StrategyName::Moderate => "moderate",
            StrategyName::Aggressive => "aggressive",
            StrategyName::Custom => "custom",
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Ok(StrategyName::Conservative),
            "moderate" => Ok(StrategyName::Moderate),
            "aggressive" => Ok(StrategyName::Aggressive),
            "custom" => Ok(StrategyName::Custom),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Outcome of a single optimize call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub original_text: String,
    pub optimized_text: String,
    pub original_tokens: usize,
    pub optimized_tokens: usize,
    /// Percentage of input tokens removed (negative if the text grew)
    pub savings_percent: f64,
    /// Input-side cost saved, in USD
    pub estimated_cost_savings: f64,
    /// Meaning preservation estimate in [0, 1]
    pub similarity_score: f64,
    /// Strategy that produced the text, e.g. `aggressive->conservative`
    pub strategy_used: String,
    pub from_cache: bool,
}

impl OptimizationResult {
    /// Signed: an optimization that expands the text reports a negative value.
    pub fn tokens_saved(&self) -> i64 {
        self.original_tokens as i64 - self.optimized_tokens as i64
    }

    /// True when the similarity gate replaced the requested strategy's output.
    pub fn fell_back(&self) -> bool {
        self.strategy_used.ends_with("->conservative")
    }
}
