//! Redundancy removal: near-duplicate sentences and repeated word runs

use super::{collapse_spaces, Analyzer, PreserveSet};
use crate::config::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static RE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zA-Z0-9]+").unwrap());
static RE_SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

const MIN_NGRAM: usize = 3;
const MAX_NGRAM: usize = 10;
/// Paragraphs shorter than this skip n-gram deduplication.
const MIN_WORDS_FOR_NGRAMS: usize = 6;

/// Detects near-duplicate sentences and repeated phrases.
#[derive(Debug, Clone)]
pub struct RedundancyAnalyzer {
    similarity_threshold: f64,
}

impl RedundancyAnalyzer {
    /// `similarity_threshold` must lie in (0, 1].
    pub fn new(similarity_threshold: f64) -> Result<Self, ConfigError> {
        if !(similarity_threshold > 0.0 && similarity_threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold {
                name: "redundancy similarity_threshold",
                value: similarity_threshold,
            });
        }
        Ok(Self {
            similarity_threshold,
        })
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    /// Keep the first occurrence's slot, but the longer text, for each
    /// near-duplicate pair. Only the first matching kept sentence counts.
    fn deduplicate_sentences<'a>(&self, sentences: Vec<&'a str>) -> Vec<&'a str> {
        let mut kept: Vec<&str> = Vec::with_capacity(sentences.len());
        let mut kept_words: Vec<HashSet<String>> = Vec::with_capacity(sentences.len());

        for sentence in sentences {
            let words = word_set(sentence);
            let duplicate = kept_words
                .iter()
                .position(|existing| jaccard(&words, existing) > self.similarity_threshold);

            match duplicate {
                Some(i) => {
                    if sentence.len() > kept[i].len() {
                        kept[i] = sentence;
                        kept_words[i] = words;
                    }
                }
                None => {
                    kept.push(sentence);
                    kept_words.push(words);
                }
            }
        }

        kept
    }
}

impl Default for RedundancyAnalyzer {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl Analyzer for RedundancyAnalyzer {
    fn name(&self) -> &'static str {
        "redundancy"
    }

    fn analyze(&self, text: &str, _preserve: &PreserveSet) -> String {
        if text.is_empty() {
            return String::new();
        }

        let paragraphs: Vec<String> = text
            .split('\n')
            .map(|paragraph| {
                if paragraph.trim().is_empty() {
                    return paragraph.to_string();
                }

                let mut sentences = split_sentences(paragraph);
                if sentences.len() > 1 {
                    sentences = self.deduplicate_sentences(sentences);
                }
                deduplicate_phrases(&sentences.join(" "))
            })
            .collect();

        collapse_spaces(&paragraphs.join("\n")).trim().to_string()
    }
}

fn word_set(text: &str) -> HashSet<String> {
    RE_WORD
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

/// Split after `.`, `!` or `?` when followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in RE_SENTENCE_END.find_iter(text) {
        // The terminator is a single ASCII byte and stays with its sentence.
        sentences.push(&text[start..m.start() + 1]);
        start = m.end();
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Remove second-and-later occurrences of repeated word runs, longest runs
/// first so whole repeated blocks go before their sub-phrases are examined.
fn deduplicate_phrases(text: &str) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < MIN_WORDS_FOR_NGRAMS {
        return text.to_string();
    }

    let max_n = (words.len() / 2).min(MAX_NGRAM);
    for n in (MIN_NGRAM..=max_n).rev() {
        let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let mut seen: HashSet<&[String]> = HashSet::new();
        let mut remove: HashSet<usize> = HashSet::new();

        for (i, ngram) in lowered.windows(n).enumerate() {
            if !seen.insert(ngram) {
                remove.extend(i..i + n);
            }
        }

        if !remove.is_empty() {
            words = words
                .into_iter()
                .enumerate()
                .filter(|(i, _)| !remove.contains(i))
                .map(|(_, w)| w)
                .collect();
        }
    }

    words.join(" ")
}
