//! Token counting for model providers
//!
//! OpenAI models get exact BPE counts through tiktoken. Anthropic and Gemini
//! publish no standalone tokenizer, so their counts are character-ratio
//! estimates; everything else falls back to a word-count heuristic.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tiktoken_rs::{cl100k_base, get_bpe_from_model, CoreBPE};
use tracing::debug;

/// Counts tokens the way a provider would bill them.
pub trait TokenCounter: Send + Sync {
    /// Identifier of the counting method
    fn name(&self) -> &str;

    /// Must return 0 for empty text
    fn count_tokens(&self, text: &str) -> usize;
}

/// Which counting method a model uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterKind {
    Openai,
    Anthropic,
    Gemini,
    Generic,
}

impl CounterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterKind::Openai => "openai",
            CounterKind::Anthropic => "anthropic",
            CounterKind::Gemini => "gemini",
            CounterKind::Generic => "generic",
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CounterKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "tiktoken" => Ok(CounterKind::Openai),
            "anthropic" => Ok(CounterKind::Anthropic),
            "gemini" | "google" => Ok(CounterKind::Gemini),
            "generic" => Ok(CounterKind::Generic),
            _ => Err(ConfigError::UnknownCounter(s.to_string())),
        }
    }
}

/// Exact BPE counts via tiktoken
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Uses the model's own encoding when tiktoken knows the model,
    /// `cl100k_base` otherwise.
    pub fn new(model: &str) -> Result<Self, ConfigError> {
        let bpe = match get_bpe_from_model(model) {
            Ok(bpe) => bpe,
            Err(_) => {
                debug!("No tiktoken encoding for {}, using cl100k_base", model);
                cl100k_base().map_err(|e| ConfigError::MissingDependency {
                    component: "tiktoken cl100k_base encoding".to_string(),
                    remediation: format!(
                        "the bundled BPE ranks failed to load ({e}); use --counter generic"
                    ),
                })?
            }
        };
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn name(&self) -> &str {
        CounterKind::Openai.as_str()
    }

    fn count_tokens(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// `round(chars / chars_per_token)`, halves to even
#[derive(Debug, Clone)]
pub struct CharRatioCounter {
    name: &'static str,
    chars_per_token: f64,
}

impl CharRatioCounter {
    pub fn new(name: &'static str, chars_per_token: f64) -> Self {
        Self {
            name,
            chars_per_token: chars_per_token.max(f64::EPSILON),
        }
    }

    pub fn anthropic() -> Self {
        Self::new(CounterKind::Anthropic.as_str(), 3.5)
    }

    pub fn gemini() -> Self {
        Self::new(CounterKind::Gemini.as_str(), 4.0)
    }
}

impl TokenCounter for CharRatioCounter {
    fn name(&self) -> &str {
        self.name
    }

    fn count_tokens(&self, text: &str) -> usize {
        (text.chars().count() as f64 / self.chars_per_token).round_ties_even() as usize
    }
}

/// `round(words * tokens_per_word)`, halves to even
#[derive(Debug, Clone)]
pub struct WordRatioCounter {
    tokens_per_word: f64,
}

impl WordRatioCounter {
    pub fn new(tokens_per_word: f64) -> Self {
        Self {
            tokens_per_word: tokens_per_word.max(0.0),
        }
    }
}

impl Default for WordRatioCounter {
    fn default() -> Self {
        Self::new(1.3)
    }
}

impl TokenCounter for WordRatioCounter {
    fn name(&self) -> &str {
        CounterKind::Generic.as_str()
    }

    fn count_tokens(&self, text: &str) -> usize {
        (text.split_whitespace().count() as f64 * self.tokens_per_word).round_ties_even() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_counts_zero() {
        let counters: Vec<Box<dyn TokenCounter>> = vec![
            Box::new(CharRatioCounter::anthropic()),
            Box::new(CharRatioCounter::gemini()),
            Box::new(WordRatioCounter::default()),
        ];
        for counter in counters {
            assert_eq!(counter.count_tokens(""), 0, "{}", counter.name());
        }
    }

    #[test]
    fn test_char_ratio_counts() {
        // 14 chars / 3.5 = 4, 14 / 4.0 = 3.5 -> 4
        let text = "abcdefghijklmn";
        assert_eq!(CharRatioCounter::anthropic().count_tokens(text), 4);
        assert_eq!(CharRatioCounter::gemini().count_tokens(text), 4);
        assert_eq!(CharRatioCounter::gemini().count_tokens("abcd abc"), 2);
    }

    #[test]
    fn test_halves_round_to_even() {
        // 10 / 4.0 = 2.5 -> 2, 18 / 4.0 = 4.5 -> 4, 22 / 4.0 = 5.5 -> 6
        let gemini = CharRatioCounter::gemini();
        assert_eq!(gemini.count_tokens("abcdefghij"), 2);
        assert_eq!(gemini.count_tokens("abcdefghijklmnopqr"), 4);
        assert_eq!(gemini.count_tokens("abcdefghijklmnopqrstuv"), 6);

        // 5 words * 0.5 = 2.5 -> 2
        assert_eq!(WordRatioCounter::new(0.5).count_tokens("a b c d e"), 2);
    }

    #[test]
    fn test_char_ratio_counts_chars_not_bytes() {
        assert_eq!(CharRatioCounter::gemini().count_tokens("ééééééé"), 2);
    }

    #[test]
    fn test_word_ratio_counts() {
        let counter = WordRatioCounter::default();
        assert_eq!(counter.count_tokens("one two three four five six seven eight nine ten"), 13);
        assert_eq!(counter.count_tokens("hello"), 1);
        assert_eq!(counter.count_tokens("   \n\t "), 0);
        assert_eq!(counter.name(), "generic");
    }

    #[test]
    fn test_tiktoken_counts() {
        let counter = TiktokenCounter::new("gpt-4").unwrap();
        assert_eq!(counter.name(), "openai");
        assert_eq!(counter.count_tokens(""), 0);
        let count = counter.count_tokens("Hello, world!");
        assert!(count > 0);
        assert!(count < "Hello, world!".len());
    }

    #[test]
    fn test_tiktoken_unknown_model_falls_back() {
        let counter = TiktokenCounter::new("not-a-real-model").unwrap();
        assert!(counter.count_tokens("hello world") > 0);
    }

    #[test]
    fn test_counter_kind_parsing() {
        assert_eq!("openai".parse::<CounterKind>().unwrap(), CounterKind::Openai);
        assert_eq!("Gemini".parse::<CounterKind>().unwrap(), CounterKind::Gemini);
        assert!(matches!(
            "bpe".parse::<CounterKind>(),
            Err(ConfigError::UnknownCounter(_))
        ));
        assert_eq!(CounterKind::Anthropic.to_string(), "anthropic");
    }
}
