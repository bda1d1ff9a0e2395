//! Meaning-preservation scoring between an original and optimized prompt
//!
//! The default backend is lexical: keyword overlap after dropping stop words
//! and the filler vocabulary, so that removing filler does not read as
//! drift. An embedding backend can be plugged in when one is available.

use crate::analyzers::FILLER_WORDS;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;

static RE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z_][a-z0-9_]*").unwrap());

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "shall", "can",
    "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "through",
    "during", "before", "after", "and", "but", "or", "nor", "not", "so", "yet", "both",
    "either", "neither", "each", "every", "all", "any", "few", "more", "most", "some", "such",
    "no", "only", "own", "same", "than", "too", "because", "if", "when", "where", "how",
    "what", "which", "who", "whom", "this", "that", "these", "those", "i", "me", "my",
    "myself", "we", "our", "ours", "you", "your", "yours", "he", "him", "his", "she", "her",
    "hers", "it", "its", "they", "them", "their", "then", "there", "here", "up", "out",
    "about", "hi", "hello", "hey", "also", "make", "sure", "want", "need", "like", "help",
    "note", "important",
];

static IGNORED: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    STOP_WORDS
        .iter()
        .chain(FILLER_WORDS.iter())
        .copied()
        .collect()
});

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("embedding backend unavailable: {0}")]
    Unavailable(String),

    #[error("embedding failed: {0}")]
    Failed(String),
}

/// Raw similarity between two non-empty, non-identical texts.
pub trait SimilarityBackend: Send + Sync {
    fn name(&self) -> &str;

    fn similarity(&self, original: &str, optimized: &str) -> f64;
}

/// Produces a sentence-level embedding vector.
pub trait EmbeddingBackend: Send + Sync {
    fn name(&self) -> &str;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// `0.4 * jaccard(keyword sets) + 0.6 * coverage(original keyword counts)`
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalBackend;

impl SimilarityBackend for LexicalBackend {
    fn name(&self) -> &str {
        "lexical"
    }

    fn similarity(&self, original: &str, optimized: &str) -> f64 {
        let original_words = keyword_counts(original);
        let optimized_words = keyword_counts(optimized);

        if original_words.is_empty() && optimized_words.is_empty() {
            return 1.0;
        }
        if original_words.is_empty() || optimized_words.is_empty() {
            return 0.0;
        }

        let mut common = 0usize;
        let mut preserved = 0usize;
        for (word, &count) in &original_words {
            if let Some(&kept) = optimized_words.get(word) {
                common += 1;
                preserved += count.min(kept);
            }
        }

        let union = original_words.len() + optimized_words.len() - common;
        let jaccard = common as f64 / union as f64;

        let total: usize = original_words.values().sum();
        let coverage = preserved as f64 / total as f64;

        0.4 * jaccard + 0.6 * coverage
    }
}

fn keyword_counts(text: &str) -> HashMap<String, usize> {
    let lowered = text.to_lowercase();
    let mut counts = HashMap::new();
    for m in RE_KEYWORD.find_iter(&lowered) {
        let word = m.as_str();
        if word.len() > 1 && !IGNORED.contains(word) {
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Cosine similarity of embeddings, lexical when embedding fails.
pub struct EmbeddingSimilarity {
    embedder: Box<dyn EmbeddingBackend>,
}

impl EmbeddingSimilarity {
    pub fn new(embedder: Box<dyn EmbeddingBackend>) -> Self {
        Self { embedder }
    }

    fn embed_pair(&self, original: &str, optimized: &str) -> Result<f64, EmbeddingError> {
        let a = self.embedder.embed(original)?;
        let b = self.embedder.embed(optimized)?;
        if a.len() != b.len() {
            return Err(EmbeddingError::Failed(format!(
                "dimension mismatch: {} vs {}",
                a.len(),
                b.len()
            )));
        }
        Ok(cosine_similarity(&a, &b) as f64)
    }
}

impl SimilarityBackend for EmbeddingSimilarity {
    fn name(&self) -> &str {
        self.embedder.name()
    }

    fn similarity(&self, original: &str, optimized: &str) -> f64 {
        match self.embed_pair(original, optimized) {
            Ok(score) => score,
            Err(e) => {
                warn!("{}: {}; using lexical similarity", self.embedder.name(), e);
                LexicalBackend.similarity(original, optimized)
            }
        }
    }
}

/// Cosine similarity in [-1, 1]; zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Scores meaning preservation in [0, 1].
pub struct SimilarityScorer {
    backend: Box<dyn SimilarityBackend>,
}

impl SimilarityScorer {
    pub fn new() -> Self {
        Self::with_backend(Box::new(LexicalBackend))
    }

    pub fn with_backend(backend: Box<dyn SimilarityBackend>) -> Self {
        Self { backend }
    }

    /// Embedding-based scoring if `load` succeeds, lexical otherwise.
    pub fn with_embeddings<F>(load: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn EmbeddingBackend>, EmbeddingError>,
    {
        match load() {
            Ok(embedder) => Self::with_backend(Box::new(EmbeddingSimilarity::new(embedder))),
            Err(e) => {
                warn!("{}; using lexical similarity", e);
                Self::new()
            }
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn score(&self, original: &str, optimized: &str) -> f64 {
        if original == optimized {
            return 1.0;
        }
        if original.is_empty() || optimized.is_empty() {
            return 0.0;
        }
        self.backend.similarity(original, optimized).clamp(0.0, 1.0)
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Embeds a text as its counts of `a` and `b`.
    struct LetterCounts;

    impl EmbeddingBackend for LetterCounts {
        fn name(&self) -> &str {
            "letter-counts"
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let count = |c: char| text.chars().filter(|&x| x == c).count() as f32;
            Ok(vec![count('a'), count('b')])
        }
    }

    struct Broken;

    impl EmbeddingBackend for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Failed("model crashed".to_string()))
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_identical_and_empty() {
        let scorer = SimilarityScorer::new();
        assert_eq!(scorer.score("hello world", "hello world"), 1.0);
        assert_eq!(scorer.score("", ""), 1.0);
        assert_eq!(scorer.score("hello", ""), 0.0);
        assert_eq!(scorer.score("", "hello"), 0.0);
    }

    #[test]
    fn test_filler_removal_keeps_full_score() {
        let scorer = SimilarityScorer::new();
        let score = scorer.score("Please just write a function", "write a function");
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_dropped_keywords_lower_score() {
        let scorer = SimilarityScorer::new();
        // jaccard 3/5, coverage 3/5
        let score = scorer.score("parse the config file and validate schema", "parse the config file");
        assert!(approx(score, 0.6));
    }

    #[test]
    fn test_coverage_counts_repeats() {
        // keywords: [cache, cache, flush] vs [cache, flush]
        // jaccard 2/2 = 1.0, coverage 2/3
        let score = LexicalBackend.similarity("cache cache flush", "cache flush");
        assert!(approx(score, 0.4 + 0.6 * (2.0 / 3.0)));
    }

    #[test]
    fn test_stop_word_only_texts() {
        let scorer = SimilarityScorer::new();
        assert_eq!(scorer.score("the and", "a or"), 1.0);
        assert_eq!(scorer.score("the", "parse"), 0.0);
    }

    #[test]
    fn test_lexical_is_default() {
        assert_eq!(SimilarityScorer::default().backend_name(), "lexical");
    }

    #[test]
    fn test_embedding_backend() {
        let scorer =
            SimilarityScorer::with_embeddings(|| Ok(Box::new(LetterCounts) as Box<dyn EmbeddingBackend>));
        assert_eq!(scorer.backend_name(), "letter-counts");
        // Lexically disjoint, identical letter counts
        assert!(approx(scorer.score("ab", "ba"), 1.0));
        // Orthogonal vectors
        assert!(approx(scorer.score("aa", "bb"), 0.0));
    }

    #[test]
    fn test_unloadable_embeddings_fall_back() {
        let scorer = SimilarityScorer::with_embeddings(|| {
            Err(EmbeddingError::Unavailable("no model on disk".to_string()))
        });
        assert_eq!(scorer.backend_name(), "lexical");
    }

    #[test]
    fn test_embedding_failure_uses_lexical() {
        let scorer =
            SimilarityScorer::with_embeddings(|| Ok(Box::new(Broken) as Box<dyn EmbeddingBackend>));
        let score = scorer.score("parse the config file and validate schema", "parse the config file");
        assert!(approx(score, 0.6));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
