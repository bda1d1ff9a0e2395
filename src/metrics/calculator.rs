//! Token counts, cost and savings for a model

use crate::providers::ModelInfo;
use crate::tokenizer::TokenCounter;

/// Counts tokens and prices them with a model's rates.
pub struct TokenCalculator {
    counter: Box<dyn TokenCounter>,
    model_info: ModelInfo,
}

impl TokenCalculator {
    pub fn new(counter: Box<dyn TokenCounter>, model_info: ModelInfo) -> Self {
        Self {
            counter,
            model_info,
        }
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.counter.count_tokens(text)
    }

    /// USD for `tokens` at the input or output rate
    pub fn calculate_cost(&self, tokens: usize, is_input: bool) -> f64 {
        let rate = if is_input {
            self.model_info.cost_per_1k_input
        } else {
            self.model_info.cost_per_1k_output
        };
        tokens as f64 / 1000.0 * rate
    }

    /// `(savings_percent, cost_savings_usd)` at the input rate. Both are
    /// negative when the optimized text is longer; `(0.0, 0.0)` when there
    /// was nothing to save.
    pub fn calculate_savings(&self, original_tokens: usize, optimized_tokens: usize) -> (f64, f64) {
        if original_tokens == 0 {
            return (0.0, 0.0);
        }

        let saved = original_tokens as f64 - optimized_tokens as f64;
        let percent = saved * 100.0 / original_tokens as f64;
        let cost =
            self.calculate_cost(original_tokens, true) - self.calculate_cost(optimized_tokens, true);

        (percent, cost)
    }

    pub fn model_info(&self) -> &ModelInfo {
        &self.model_info
    }

    pub fn counter_name(&self) -> &str {
        self.counter.name()
    }
}
