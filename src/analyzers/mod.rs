//! Text analyzers that detect and remove token waste
//!
//! Each analyzer is an independent rewriting pass over plain text. Strategies
//! chain them into pipelines (see [`crate::optimization`]).
//!
//! Every analyzer:
//! - validates its aggressiveness (or threshold) at construction time
//! - is total over arbitrary text, including non-ASCII input
//! - returns empty input unchanged
//! - skips any rule whose pattern contains a preserved keyword

mod filler;
mod redundancy;
mod structural;
mod verbosity;

pub use filler::FillerAnalyzer;
pub(crate) use filler::FILLER_WORDS;
pub use redundancy::RedundancyAnalyzer;
pub use structural::StructuralAnalyzer;
pub use verbosity::VerbosityAnalyzer;

use crate::config::ConfigError;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::warn;

static RE_MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"  +").unwrap());
static RE_SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ([.,;:!?])").unwrap());
static RE_LEADING_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s+").unwrap());

/// How destructive an analyzer is allowed to be.
///
/// Levels are cumulative: `High` applies everything `Medium` does, which
/// applies everything `Low` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Aggressiveness {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Aggressiveness {
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Aggressiveness {
    type Error = ConfigError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            other => Err(ConfigError::InvalidAggressiveness(other)),
        }
    }
}

impl From<Aggressiveness> for u8 {
    fn from(level: Aggressiveness) -> Self {
        level.level()
    }
}

/// Case-insensitive set of keywords that analyzers must leave alone.
///
/// Keywords may span several words or carry punctuation ("in order to",
/// "just-in-time", "__init__"). Besides skipping rules whose pattern names a
/// keyword, analyzers refuse any match that overlaps an occurrence of one.
#[derive(Debug, Clone, Default)]
pub struct PreserveSet {
    words: HashSet<String>,
    /// Alternation of every keyword, longest first
    matcher: Option<Regex>,
}

impl PartialEq for PreserveSet {
    fn eq(&self, other: &Self) -> bool {
        self.words == other.words
    }
}

impl Eq for PreserveSet {}

impl PreserveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        set.extend(keywords);
        set
    }

    pub fn extend<I, S>(&mut self, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words.extend(
            keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty()),
        );
        self.matcher = keyword_matcher(&self.words);
    }

    pub fn contains(&self, word: &str) -> bool {
        !self.words.is_empty() && self.words.contains(&word.to_lowercase())
    }

    /// True when any word of `phrase` is preserved, or a preserved
    /// multi-word keyword appears inside it.
    pub fn guards_phrase(&self, phrase: &str) -> bool {
        if self.words.is_empty() {
            return false;
        }
        if phrase.split_whitespace().any(|w| self.contains(w)) {
            return true;
        }
        self.matcher
            .as_ref()
            .is_some_and(|matcher| matcher.is_match(phrase))
    }

    /// Byte ranges of every keyword occurrence in `text`
    pub fn protected_spans(&self, text: &str) -> ProtectedSpans {
        let spans = match &self.matcher {
            Some(matcher) => matcher.find_iter(text).map(|m| m.range()).collect(),
            None => Vec::new(),
        };
        ProtectedSpans(spans)
    }

    /// True when every keyword found in `original` is still in `rewritten`.
    pub fn survives(&self, original: &str, rewritten: &str) -> bool {
        let Some(matcher) = &self.matcher else {
            return true;
        };
        let found: HashSet<String> = matcher
            .find_iter(original)
            .map(|m| m.as_str().to_lowercase())
            .collect();
        let kept: HashSet<String> = matcher
            .find_iter(rewritten)
            .map(|m| m.as_str().to_lowercase())
            .collect();
        found.is_subset(&kept)
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }
}

/// Keyword occurrences in one version of a text; stale once the text changes.
#[derive(Debug, Clone, Default)]
pub struct ProtectedSpans(Vec<Range<usize>>);

impl ProtectedSpans {
    pub fn overlaps(&self, range: Range<usize>) -> bool {
        self.0
            .iter()
            .any(|span| range.start < span.end && span.start < range.end)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Word edges are required only where the keyword itself starts or ends
/// with a word character, so "c++" and "**bold**" still match.
fn keyword_matcher(words: &HashSet<String>) -> Option<Regex> {
    if words.is_empty() {
        return None;
    }

    let mut keywords: Vec<&String> = words.iter().collect();
    keywords.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternation: Vec<String> = keywords
        .iter()
        .map(|keyword| {
            let head = if keyword.starts_with(is_word_char) { r"\b" } else { "" };
            let tail = if keyword.ends_with(is_word_char) { r"\b" } else { "" };
            format!("{}{}{}", head, regex::escape(keyword), tail)
        })
        .collect();

    match Regex::new(&format!("(?i){}", alternation.join("|"))) {
        Ok(matcher) => Some(matcher),
        Err(e) => {
            warn!("Preserved keywords could not be compiled: {}", e);
            None
        }
    }
}

/// A single text-rewriting pass.
pub trait Analyzer: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Rewrite `text`, leaving every preserved keyword intact
    fn analyze(&self, text: &str, preserve: &PreserveSet) -> String;
}

/// Spacing cleanup shared by the word-level analyzers: collapse double
/// spaces, drop spaces before punctuation, strip leading whitespace on each
/// line, trim.
pub(crate) fn tidy_spacing(text: &str) -> String {
    let result = RE_MULTI_SPACE.replace_all(text, " ");
    let result = RE_SPACE_BEFORE_PUNCT.replace_all(&result, "$1");
    let result = RE_LEADING_WS.replace_all(&result, "");
    result.trim().to_string()
}

pub(crate) fn collapse_spaces(text: &str) -> String {
    RE_MULTI_SPACE.replace_all(text, " ").into_owned()
}

/// Case-insensitive literal pattern bounded by word edges.
pub(crate) fn phrase_regex(phrase: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase))).unwrap()
}

/// `regex.replace_all`, except matches overlapping a preserved keyword are
/// left as they are.
pub(crate) fn replace_unprotected<F>(
    regex: &Regex,
    text: &str,
    preserve: &PreserveSet,
    mut replacer: F,
) -> String
where
    F: FnMut(&Captures) -> String,
{
    let spans = preserve.protected_spans(text);
    regex
        .replace_all(text, |caps: &Captures| {
            let matched = caps.get_match();
            if spans.overlaps(matched.range()) {
                matched.as_str().to_string()
            } else {
                replacer(caps)
            }
        })
        .into_owned()
}

/// Replacement that keeps an initial capital from the matched span.
pub(crate) fn match_case(matched: &str, replacement: &str) -> String {
    let starts_upper = matched.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper {
        return replacement.to_string();
    }

    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
