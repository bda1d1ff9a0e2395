//! Prompt optimization with a similarity-gated fallback
//!
//! This module ties the pieces together for a single optimize call:
//! - Cache lookup keyed by the combined system + user text
//! - The configured strategy, then a drift check against the original
//! - Automatic fallback to the conservative strategy when drift is too high
//! - Token, cost and running metrics for the result

use crate::analyzers::PreserveSet;
use crate::cache::{CacheStats, PromptCache, DEFAULT_CAPACITY};
use crate::config::ConfigError;
use crate::metrics::{SimilarityScorer, TokenCalculator, TokenMetrics};
use crate::optimization::{OptimizationResult, OptimizationStrategy, Pipeline, StrategyName};
use crate::providers::{ModelInfo, ProviderRegistry};
use crate::tokenizer::CounterKind;
use tracing::{debug, warn};

/// Similarity below which results fall back to the conservative strategy
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.4;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Model used to pick the token counter and pricing
    pub model: String,
    /// Strategy to run
    pub strategy: StrategyName,
    /// Overrides the registry's input price (USD per 1K tokens)
    pub cost_per_1k_input: Option<f64>,
    /// Overrides the registry's output price (USD per 1K tokens)
    pub cost_per_1k_output: Option<f64>,
    /// Keywords preserved on every call
    pub preserve_keywords: Vec<String>,
    /// Minimum similarity, in [0, 1], before falling back
    pub similarity_threshold: f64,
    pub cache_enabled: bool,
    pub cache_capacity: usize,
    /// Force a token counter instead of the model's own; fails rather than
    /// degrading when it cannot load
    pub counter: Option<CounterKind>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            strategy: StrategyName::Moderate,
            cost_per_1k_input: None,
            cost_per_1k_output: None,
            preserve_keywords: Vec::new(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            cache_enabled: true,
            cache_capacity: DEFAULT_CAPACITY,
            counter: None,
        }
    }
}

/// Runs a strategy over prompts and reports what it saved.
///
/// Holds a private cache and running metrics, so `optimize` takes
/// `&mut self`; give each worker its own instance.
pub struct Orchestrator {
    config: OrchestratorConfig,
    strategy: Box<dyn OptimizationStrategy>,
    fallback: Pipeline,
    calculator: TokenCalculator,
    similarity: SimilarityScorer,
    cache: Option<PromptCache>,
    preserve: PreserveSet,
    metrics: TokenMetrics,
}

impl Orchestrator {
    /// Build with the strategy named in `config`.
    pub fn new(config: OrchestratorConfig) -> Result<Self, ConfigError> {
        let strategy = Box::new(Pipeline::for_name(config.strategy));
        Self::build(config, strategy, &ProviderRegistry::new())
    }

    /// Build around a caller-supplied strategy; `config.strategy` is ignored.
    pub fn with_strategy(
        config: OrchestratorConfig,
        strategy: impl OptimizationStrategy + 'static,
    ) -> Result<Self, ConfigError> {
        Self::build(config, Box::new(strategy), &ProviderRegistry::new())
    }

    /// Build with model lookups going through `registry`.
    pub fn with_registry(
        config: OrchestratorConfig,
        registry: &ProviderRegistry,
    ) -> Result<Self, ConfigError> {
        let strategy = Box::new(Pipeline::for_name(config.strategy));
        Self::build(config, strategy, registry)
    }

    /// Replace the similarity scorer
    pub fn with_similarity(mut self, scorer: SimilarityScorer) -> Self {
        self.similarity = scorer;
        self
    }

    fn build(
        config: OrchestratorConfig,
        strategy: Box<dyn OptimizationStrategy>,
        registry: &ProviderRegistry,
    ) -> Result<Self, ConfigError> {
        let threshold = config.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold {
                name: "similarity_threshold",
                value: threshold,
            });
        }

        let mut model_info = registry.lookup(&config.model);
        if let Some(input) = config.cost_per_1k_input {
            model_info.cost_per_1k_input = input;
        }
        if let Some(output) = config.cost_per_1k_output {
            model_info.cost_per_1k_output = output;
        }

        let counter = match config.counter {
            Some(kind) => registry.counter_of_kind(kind, &config.model)?,
            None => registry.counter_for(&config.model),
        };

        debug!(
            "Orchestrator: model={} provider={} counter={} strategy={}",
            config.model,
            model_info.provider,
            counter.name(),
            strategy.name()
        );

        let cache = config
            .cache_enabled
            .then(|| PromptCache::new(config.cache_capacity));
        let preserve = PreserveSet::from_keywords(&config.preserve_keywords);

        Ok(Self {
            strategy,
            fallback: Pipeline::conservative(),
            calculator: TokenCalculator::new(counter, model_info),
            similarity: SimilarityScorer::new(),
            cache,
            preserve,
            metrics: TokenMetrics::new(),
            config,
        })
    }

    /// Optimize `prompt`, prefixed by `system_prompt` when given.
    ///
    /// `extra_preserve` is merged with the configured keywords for this call
    /// only.
    pub fn optimize(
        &mut self,
        prompt: &str,
        system_prompt: Option<&str>,
        extra_preserve: &[String],
    ) -> OptimizationResult {
        let full_text = match system_prompt {
            Some(system) if !system.is_empty() => format!("{}\n\n{}", system, prompt),
            _ => prompt.to_string(),
        };
        let strategy_name = self.strategy.name().to_string();
        let merged = (!extra_preserve.is_empty()).then(|| {
            let mut merged = self.preserve.clone();
            merged.extend(extra_preserve);
            merged
        });
        let preserve = merged.as_ref().unwrap_or(&self.preserve);

        // A cached rewrite made under other keywords may have dropped one of ours.
        let cached = self
            .cache
            .as_mut()
            .and_then(|cache| cache.get(&full_text, &strategy_name))
            .filter(|cached| {
                let usable = preserve.survives(&full_text, cached);
                if !usable {
                    debug!("Cached result drops a preserved keyword, recomputing");
                }
                usable
            });
        if let Some(cached) = cached {
            let similarity = self.similarity.score(&full_text, &cached);
            return self.finish(full_text, cached, similarity, strategy_name, true);
        }

        let optimized = self.strategy.optimize(&full_text, preserve);
        let similarity = self.similarity.score(&full_text, &optimized);

        let (optimized, similarity, strategy_used) = if similarity
            < self.config.similarity_threshold
            && strategy_name != StrategyName::Conservative.as_str()
        {
            warn!(
                "{} similarity {:.3} below threshold {:.3}, falling back to conservative",
                strategy_name, similarity, self.config.similarity_threshold
            );
            let fallback = self.fallback.optimize(&full_text, preserve);
            let rescored = self.similarity.score(&full_text, &fallback);
            let used = format!("{}->{}", strategy_name, StrategyName::Conservative);
            (fallback, rescored, used)
        } else {
            (optimized, similarity, strategy_name.clone())
        };

        if let Some(cache) = self.cache.as_mut() {
            cache.put(&full_text, &strategy_name, optimized.as_str());
        }

        self.finish(full_text, optimized, similarity, strategy_used, false)
    }

    fn finish(
        &mut self,
        original_text: String,
        optimized_text: String,
        similarity_score: f64,
        strategy_used: String,
        from_cache: bool,
    ) -> OptimizationResult {
        let original_tokens = self.calculator.count_tokens(&original_text);
        let optimized_tokens = self.calculator.count_tokens(&optimized_text);
        let (savings_percent, estimated_cost_savings) = self
            .calculator
            .calculate_savings(original_tokens, optimized_tokens);

        let result = OptimizationResult {
            original_text,
            optimized_text,
            original_tokens,
            optimized_tokens,
            savings_percent,
            estimated_cost_savings,
            similarity_score,
            strategy_used,
            from_cache,
        };
        self.metrics.record(&result);
        result
    }

    pub fn metrics(&self) -> &TokenMetrics {
        &self.metrics
    }

    /// `None` when caching is disabled
    pub fn cache_stats(&self) -> Option<&CacheStats> {
        self.cache.as_ref().map(PromptCache::stats)
    }

    pub fn cache_size(&self) -> usize {
        self.cache.as_ref().map_or(0, PromptCache::size)
    }

    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }

    /// Model info after pricing overrides
    pub fn model_info(&self) -> &ModelInfo {
        self.calculator.model_info()
    }

    pub fn counter_name(&self) -> &str {
        self.calculator.counter_name()
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.config.similarity_threshold
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}
