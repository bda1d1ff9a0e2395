//! Metrics and tracking for token usage

mod calculator;
mod similarity;

pub use calculator::TokenCalculator;
pub use similarity::{
    cosine_similarity, EmbeddingBackend, EmbeddingError, EmbeddingSimilarity, LexicalBackend,
    SimilarityBackend, SimilarityScorer,
};

use crate::optimization::OptimizationResult;
use serde::Serialize;

/// Running totals across an optimizer's lifetime
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenMetrics {
    /// Optimize calls served, cached or not
    pub optimizations: u64,
    /// Calls answered from the result cache
    pub cache_hits: u64,
    /// Calls where the similarity gate fell back to conservative
    pub fallbacks: u64,
    /// Input tokens before optimization
    pub original_tokens: u64,
    /// Input tokens after optimization
    pub optimized_tokens: u64,
    /// Estimated input cost saved (USD)
    pub cost_savings: f64,
}

impl TokenMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &OptimizationResult) {
        self.optimizations += 1;
        if result.from_cache {
            self.cache_hits += 1;
        }
        if result.fell_back() {
            self.fallbacks += 1;
        }
        self.original_tokens += result.original_tokens as u64;
        self.optimized_tokens += result.optimized_tokens as u64;
        self.cost_savings += result.estimated_cost_savings;
    }

    /// Signed: negative if optimization grew the input overall
    pub fn tokens_saved(&self) -> i64 {
        self.original_tokens as i64 - self.optimized_tokens as i64
    }

    pub fn compression_ratio(&self) -> f64 {
        if self.original_tokens == 0 {
            return 1.0;
        }
        self.optimized_tokens as f64 / self.original_tokens as f64
    }

    pub fn savings_percent(&self) -> f64 {
        if self.original_tokens == 0 {
            return 0.0;
        }
        self.tokens_saved() as f64 * 100.0 / self.original_tokens as f64
    }
}

impl std::fmt::Display for TokenMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Token Metrics Summary ===")?;
        writeln!(f, "Optimizations: {}", self.optimizations)?;
        writeln!(f, "Cache hits: {}", self.cache_hits)?;
        writeln!(f, "Fallbacks: {}", self.fallbacks)?;
        writeln!(
            f,
            "Tokens: {} -> {} (saved {}, {:.1}%)",
            self.original_tokens,
            self.optimized_tokens,
            self.tokens_saved(),
            self.savings_percent()
        )?;
        writeln!(f, "Compression ratio: {:.2}%", self.compression_ratio() * 100.0)?;
        writeln!(f, "Estimated savings: ${:.6}", self.cost_savings)?;
        Ok(())
    }
}
