//! Model registry: provider, token counter and per-1K pricing by model name

use crate::config::ConfigError;
use crate::tokenizer::CounterKind::{Anthropic, Gemini, Generic, Openai};
use crate::tokenizer::{
    CharRatioCounter, CounterKind, TiktokenCounter, TokenCounter, WordRatioCounter,
};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::warn;

/// Pricing and counting info for a model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub provider: String,
    pub counter: CounterKind,
    /// USD per 1000 input tokens
    pub cost_per_1k_input: f64,
    /// USD per 1000 output tokens
    pub cost_per_1k_output: f64,
}

impl ModelInfo {
    pub fn new(
        provider: impl Into<String>,
        counter: CounterKind,
        cost_per_1k_input: f64,
        cost_per_1k_output: f64,
    ) -> Self {
        Self {
            provider: provider.into(),
            counter,
            cost_per_1k_input,
            cost_per_1k_output,
        }
    }

    /// Fallback for model names nothing matches
    pub fn unknown() -> Self {
        Self::new("unknown", CounterKind::Generic, 0.0, 0.0)
    }
}

/// Checked in order; the first case-insensitive match wins, so more specific
/// names come before their prefixes.
const MODEL_PATTERNS: &[(&str, &str, CounterKind, f64, f64)] = &[
    // OpenAI
    (r"gpt-4o-mini", "openai", Openai, 0.00015, 0.0006),
    (r"gpt-4o", "openai", Openai, 0.0025, 0.01),
    (r"gpt-4-turbo", "openai", Openai, 0.01, 0.03),
    (r"gpt-4", "openai", Openai, 0.03, 0.06),
    (r"gpt-3\.5-turbo", "openai", Openai, 0.0005, 0.0015),
    (r"o1-mini", "openai", Openai, 0.003, 0.012),
    (r"o1-pro", "openai", Openai, 0.15, 0.60),
    (r"o1", "openai", Openai, 0.015, 0.06),
    (r"o3-mini", "openai", Openai, 0.0011, 0.0044),
    (r"o3", "openai", Openai, 0.01, 0.04),
    // Anthropic
    (r"claude-opus-4", "anthropic", Anthropic, 0.015, 0.075),
    (r"claude-sonnet-4", "anthropic", Anthropic, 0.003, 0.015),
    (r"claude-haiku-4", "anthropic", Anthropic, 0.0008, 0.004),
    (r"claude-3-5-sonnet", "anthropic", Anthropic, 0.003, 0.015),
    (r"claude-3-5-haiku", "anthropic", Anthropic, 0.0008, 0.004),
    (r"claude-3-opus", "anthropic", Anthropic, 0.015, 0.075),
    (r"claude-3-sonnet", "anthropic", Anthropic, 0.003, 0.015),
    (r"claude-3-haiku", "anthropic", Anthropic, 0.00025, 0.00125),
    (r"claude", "anthropic", Anthropic, 0.003, 0.015),
    // Google
    (r"gemini-2\.0-flash", "google", Gemini, 0.0001, 0.0004),
    (r"gemini-1\.5-pro", "google", Gemini, 0.00125, 0.005),
    (r"gemini-1\.5-flash", "google", Gemini, 0.000075, 0.0003),
    (r"gemini-pro", "google", Gemini, 0.0005, 0.0015),
    (r"gemini", "google", Gemini, 0.0001, 0.0004),
    // Mistral
    (r"mistral-large", "mistral", Generic, 0.003, 0.009),
    (r"mistral-medium", "mistral", Generic, 0.0027, 0.0081),
    (r"mistral-small", "mistral", Generic, 0.001, 0.003),
    (r"mistral", "mistral", Generic, 0.001, 0.003),
    // Cohere
    (r"command-r-plus", "cohere", Generic, 0.003, 0.015),
    (r"command-r", "cohere", Generic, 0.0005, 0.0015),
    (r"command", "cohere", Generic, 0.001, 0.002),
];

static PATTERNS: LazyLock<Vec<(Regex, ModelInfo)>> = LazyLock::new(|| {
    MODEL_PATTERNS
        .iter()
        .map(|&(pattern, provider, counter, input, output)| {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .unwrap();
            (regex, ModelInfo::new(provider, counter, input, output))
        })
        .collect()
});

/// Maps model names to providers, counters and pricing.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    custom: HashMap<String, ModelInfo>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-name entry consulted before the built-in table
    pub fn register_model(&mut self, model: impl Into<String>, info: ModelInfo) {
        self.custom.insert(model.into(), info);
    }

    /// Never fails: unknown names resolve to [`ModelInfo::unknown`].
    pub fn lookup(&self, model: &str) -> ModelInfo {
        if let Some(info) = self.custom.get(model) {
            return info.clone();
        }

        PATTERNS
            .iter()
            .find(|(regex, _)| regex.is_match(model))
            .map(|(_, info)| info.clone())
            .unwrap_or_else(ModelInfo::unknown)
    }

    /// Counter for `model`, degrading to the generic word counter when the
    /// precise one cannot load.
    pub fn counter_for(&self, model: &str) -> Box<dyn TokenCounter> {
        let kind = self.lookup(model).counter;
        match counter_of_kind(kind, model) {
            Ok(counter) => counter,
            Err(e) => {
                warn!("{}; falling back to the generic counter", e);
                Box::new(WordRatioCounter::default())
            }
        }
    }

    /// Counter of exactly `kind`, with no fallback.
    pub fn counter_of_kind(
        &self,
        kind: CounterKind,
        model: &str,
    ) -> Result<Box<dyn TokenCounter>, ConfigError> {
        counter_of_kind(kind, model)
    }
}

fn counter_of_kind(kind: CounterKind, model: &str) -> Result<Box<dyn TokenCounter>, ConfigError> {
    let counter: Box<dyn TokenCounter> = match kind {
        CounterKind::Openai => Box::new(TiktokenCounter::new(model)?),
        CounterKind::Anthropic => Box::new(CharRatioCounter::anthropic()),
        CounterKind::Gemini => Box::new(CharRatioCounter::gemini()),
        CounterKind::Generic => Box::new(WordRatioCounter::default()),
    };
    Ok(counter)
}
