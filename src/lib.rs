//! prompt-optimizer - Compress LLM prompts to cut token usage and cost
//!
//! This library rewrites natural-language prompts to use fewer tokens while
//! keeping their meaning, and reports what the rewrite saved.
//!
//! ## Key Features
//!
//! - **Analyzers**: Independent passes for filler, verbosity, redundancy and markdown structure
//! - **Strategies**: Conservative, moderate and aggressive pipelines, plus custom analyzer chains
//! - **Drift Check**: A similarity gate that falls back to the conservative strategy
//! - **Metrics**: Per-provider token counting, pricing, and cost savings
//! - **Caching**: LRU result cache keyed by content hash and strategy
//!
//! ```no_run
//! use prompt_optimizer::{Orchestrator, OrchestratorConfig};
//!
//! let mut optimizer = Orchestrator::new(OrchestratorConfig::default())?;
//! let result = optimizer.optimize("Could you please write a function that sorts a list?", None, &[]);
//! println!("{} ({:.1}% saved)", result.optimized_text, result.savings_percent);
//! # Ok::<(), prompt_optimizer::ConfigError>(())
//! ```

pub mod analyzers;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod optimization;
pub mod orchestrator;
pub mod providers;
pub mod tokenizer;

pub use analyzers::{
    Aggressiveness, Analyzer, FillerAnalyzer, PreserveSet, RedundancyAnalyzer, StructuralAnalyzer,
    VerbosityAnalyzer,
};
pub use cache::{CacheStats, PromptCache};
pub use config::{Config, ConfigBuilder, ConfigError};
pub use metrics::{SimilarityScorer, TokenCalculator, TokenMetrics};
pub use optimization::{OptimizationResult, OptimizationStrategy, Pipeline, StrategyName};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use providers::{ModelInfo, ProviderRegistry};
pub use tokenizer::{CounterKind, TokenCounter};
