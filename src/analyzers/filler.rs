//! Filler removal: polite wrappers, hedges and intensifiers

use super::{
    phrase_regex, replace_unprotected, tidy_spacing, Aggressiveness, Analyzer, PreserveSet,
};
use crate::config::ConfigError;
use regex::Regex;
use std::sync::LazyLock;

/// Ordered longest first so shorter phrases never shadow longer ones.
const FILLER_PHRASES: &[&str] = &[
    "What I want is for you to",
    "It would be great if you could",
    "I was wondering if you could",
    "I'd appreciate it if you could",
    "If it's not too much trouble",
    "I'm looking for you to",
    "I was hoping you could",
    "Do you think you could",
    "I'd appreciate if you",
    "I would like you to",
    "Can you help me to",
    "Please help me to",
    "Could you possibly",
    "Could you please",
    "Would you please",
    "Would you mind",
    "I'm hoping you can",
    "Can you help me",
    "Please help me",
    "If you don't mind",
    "I want you to",
    "Can you please",
    "What I need is",
    "I need you to",
    "Help me to",
    "For the purpose of",
];

pub(crate) const FILLER_WORDS: &[&str] = &[
    "please",
    "kindly",
    "just",
    "basically",
    "actually",
    "really",
    "very",
    "quite",
    "simply",
    "literally",
    "honestly",
    "frankly",
    "obviously",
    "clearly",
    "definitely",
    "certainly",
    "absolutely",
    "essentially",
    "virtually",
    "practically",
];

/// Punctuated variants come first so "Hi," is consumed whole.
const POLITE_OPENERS: &[&str] = &[
    "Hi,", "Hello,", "Hey,", "Hi!", "Hello!", "Hey!", "Hi", "Hello", "Hey",
];

static PHRASE_RULES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    FILLER_PHRASES
        .iter()
        .map(|phrase| (*phrase, phrase_regex(phrase)))
        .collect()
});

static WORD_RULES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    FILLER_WORDS
        .iter()
        .map(|word| (*word, phrase_regex(word)))
        .collect()
});

/// Removes filler words and phrases that add no semantic value.
#[derive(Debug, Clone)]
pub struct FillerAnalyzer {
    aggressiveness: Aggressiveness,
}

impl FillerAnalyzer {
    /// Fails unless `level` is 1, 2 or 3.
    pub fn new(level: u8) -> Result<Self, ConfigError> {
        Ok(Self::with_level(Aggressiveness::try_from(level)?))
    }

    pub fn with_level(aggressiveness: Aggressiveness) -> Self {
        Self { aggressiveness }
    }

    pub fn aggressiveness(&self) -> Aggressiveness {
        self.aggressiveness
    }
}

impl Default for FillerAnalyzer {
    fn default() -> Self {
        Self::with_level(Aggressiveness::Medium)
    }
}

impl Analyzer for FillerAnalyzer {
    fn name(&self) -> &'static str {
        "filler"
    }

    fn analyze(&self, text: &str, preserve: &PreserveSet) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut result = text.to_string();

        for (phrase, pattern) in PHRASE_RULES.iter() {
            if preserve.guards_phrase(phrase) {
                continue;
            }
            result = replace_unprotected(pattern, &result, preserve, |_| String::new());
        }

        if self.aggressiveness >= Aggressiveness::Medium {
            for (word, pattern) in WORD_RULES.iter() {
                if preserve.contains(word) {
                    continue;
                }
                result = replace_unprotected(pattern, &result, preserve, |_| String::new());
            }
        }

        if self.aggressiveness >= Aggressiveness::High {
            result = strip_opener(result.trim_start(), preserve).to_string();
        }

        tidy_spacing(&result)
    }
}

fn strip_opener<'a>(text: &'a str, preserve: &PreserveSet) -> &'a str {
    for opener in POLITE_OPENERS {
        let Some(head) = text.get(..opener.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(opener) {
            continue;
        }

        let rest = &text[opener.len()..];
        // A bare greeting must end at a word edge ("Hi" but not "History").
        let ends_word = opener.ends_with(|c: char| !c.is_alphanumeric())
            || !rest.starts_with(|c: char| c.is_alphanumeric());
        if !ends_word {
            continue;
        }

        let word = opener.trim_end_matches(|c: char| !c.is_alphanumeric());
        if preserve.contains(word) || preserve.protected_spans(text).overlaps(0..opener.len()) {
            return text;
        }
        return rest.trim_start();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(level: u8, text: &str) -> String {
        FillerAnalyzer::new(level)
            .unwrap()
            .analyze(text, &PreserveSet::new())
    }

    #[test]
    fn test_removes_filler_phrases() {
        let result = run(1, "I would like you to write a function");
        assert!(!result.contains("I would like you to"));
        assert_eq!(result, "write a function");
    }

    #[test]
    fn test_phrases_are_case_insensitive() {
        let result = run(1, "could you please summarize this?");
        assert_eq!(result, "summarize this?");
    }

    #[test]
    fn test_longest_phrase_wins() {
        // "Can you help me" alone would leave a stray "to".
        let result = run(1, "Can you help me to refactor this");
        assert_eq!(result, "refactor this");
    }

    #[test]
    fn test_removes_filler_words_at_level_2() {
        let result = run(2, "Please just basically write a very simple function");
        let words: Vec<&str> = result.split_whitespace().collect();
        assert!(!words.contains(&"just"));
        assert!(!words.contains(&"basically"));
        assert!(!words.contains(&"very"));
        assert_eq!(result, "write a simple function");
    }

    #[test]
    fn test_filler_words_respect_word_boundaries() {
        let result = run(2, "Adjust the justification");
        assert_eq!(result, "Adjust the justification");
    }

    #[test]
    fn test_level_1_keeps_filler_words() {
        let result = run(1, "just basically write a function");
        assert!(result.contains("just"));
        assert!(result.contains("basically"));
    }

    #[test]
    fn test_level_3_strips_polite_openers() {
        let result = run(3, "Hi, can you write a function?");
        assert!(!result.to_lowercase().starts_with("hi,"));
        assert_eq!(result, "can you write a function?");

        let result = run(3, "  Hello! Summarize the report.");
        assert_eq!(result, "Summarize the report.");
    }

    #[test]
    fn test_opener_needs_word_edge() {
        assert_eq!(run(3, "History of Rome"), "History of Rome");
        assert_eq!(run(3, "Heyday of the web"), "Heyday of the web");
    }

    #[test]
    fn test_preserves_keywords() {
        let analyzer = FillerAnalyzer::new(2).unwrap();
        let preserve = PreserveSet::from_keywords(["just"]);
        let result = analyzer.analyze("Please just return the result", &preserve);
        assert!(result.contains("just"));
        assert!(!result.contains("Please"));
    }

    #[test]
    fn test_preserved_word_blocks_whole_phrase() {
        let analyzer = FillerAnalyzer::new(1).unwrap();
        let preserve = PreserveSet::from_keywords(["like"]);
        let result = analyzer.analyze("I would like you to write tests", &preserve);
        assert_eq!(result, "I would like you to write tests");
    }

    #[test]
    fn test_hyphenated_keyword_is_untouched() {
        let analyzer = FillerAnalyzer::new(2).unwrap();
        let preserve = PreserveSet::from_keywords(["just-in-time"]);
        let result = analyzer.analyze("Use just-in-time compilation, just once", &preserve);
        assert_eq!(result, "Use just-in-time compilation, once");
    }

    #[test]
    fn test_multi_word_keyword_blocks_phrase() {
        let analyzer = FillerAnalyzer::new(3).unwrap();
        let preserve = PreserveSet::from_keywords(["could you please"]);
        let result = analyzer.analyze("Could you please sort the list", &preserve);
        assert_eq!(result, "Could you please sort the list");
    }

    #[test]
    fn test_cleanup_fixes_punctuation_spacing() {
        let result = run(2, "Write tests , really .");
        assert_eq!(result, "Write tests,.");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(run(1, ""), "");
        assert_eq!(run(3, ""), "");
    }

    #[test]
    fn test_no_fillers_unchanged() {
        let result = run(2, "Write a function that returns the sum");
        assert_eq!(result, "Write a function that returns the sum");
    }

    #[test]
    fn test_non_ascii_input() {
        let result = run(3, "Héllo wörld, just ünïcode ✓");
        assert_eq!(result, "Héllo wörld, ünïcode ✓");
    }

    #[test]
    fn test_invalid_aggressiveness() {
        assert!(matches!(
            FillerAnalyzer::new(0),
            Err(ConfigError::InvalidAggressiveness(0))
        ));
        assert!(FillerAnalyzer::new(4).is_err());
    }

    #[test]
    fn test_higher_levels_never_longer() {
        let text = "Hi, I would like you to please just write a really simple parser.";
        let l1 = run(1, text);
        let l2 = run(2, text);
        let l3 = run(3, text);
        assert!(l2.len() <= l1.len());
        assert!(l3.len() <= l2.len());
    }
}
