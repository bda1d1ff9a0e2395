//! Verbosity reduction: wordy constructions rewritten to concise forms

use super::{
    match_case, phrase_regex, replace_unprotected, tidy_spacing, Aggressiveness, Analyzer,
    PreserveSet,
};
use crate::config::ConfigError;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Applied in order; an empty replacement deletes the phrase.
const REWRITE_RULES: &[(&str, &str)] = &[
    ("in spite of the fact that", "although"),
    ("it is important to note that", ""),
    ("it is worth mentioning that", ""),
    ("it should be noted that", ""),
    ("a significant amount of", "much"),
    ("due to the fact that", "because"),
    ("at this point in time", "now"),
    ("take into consideration", "consider"),
    ("at the present time", "now"),
    ("as a matter of fact", ""),
    ("give an indication of", "indicate"),
    ("come to a conclusion", "conclude"),
    ("in the event that", "if"),
    ("for the purpose of", "to"),
    ("a large number of", "many"),
    ("a small number of", "few"),
    ("has the ability to", "can"),
    ("on the other hand", "however"),
    ("make a decision", "decide"),
    ("take into account", "consider"),
    ("the majority of", "most"),
    ("with regard to", "regarding"),
    ("with respect to", "regarding"),
    ("is capable of", "can"),
    ("what I mean is", ""),
    ("in addition to", "besides"),
    ("the thing is", ""),
    ("in order to", "to"),
    ("is able to", "can"),
];

/// Verbs whose following article can be dropped.
const INSTRUCTION_VERBS: &[&str] = &["write", "create", "build", "make", "return", "get", "find"];

const PRONOUN_RULES: &[(&str, &str)] = &[
    ("you need to", ""),
    ("you should", ""),
    ("you must", "must"),
    ("you can", "can"),
];

struct RewriteRule {
    pattern: &'static str,
    replacement: &'static str,
    regex: Regex,
}

fn compile(rules: &[(&'static str, &'static str)]) -> Vec<RewriteRule> {
    rules
        .iter()
        .map(|&(pattern, replacement)| RewriteRule {
            pattern,
            replacement,
            regex: phrase_regex(pattern),
        })
        .collect()
}

static REWRITES: LazyLock<Vec<RewriteRule>> = LazyLock::new(|| compile(REWRITE_RULES));
static PRONOUNS: LazyLock<Vec<RewriteRule>> = LazyLock::new(|| compile(PRONOUN_RULES));

static ARTICLE_RULES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    INSTRUCTION_VERBS
        .iter()
        .map(|verb| {
            let regex = Regex::new(&format!(
                r"(?i)\b({})\s+(a|an|the)\b",
                regex::escape(verb)
            ))
            .unwrap();
            (*verb, regex)
        })
        .collect()
});

/// Rewrites verbose phrases with concise equivalents.
#[derive(Debug, Clone)]
pub struct VerbosityAnalyzer {
    aggressiveness: Aggressiveness,
}

impl VerbosityAnalyzer {
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

impl Default for VerbosityAnalyzer {
    fn default() -> Self {
        Self::with_level(Aggressiveness::Low)
    }
}

impl Analyzer for VerbosityAnalyzer {
    fn name(&self) -> &'static str {
        "verbosity"
    }

    fn analyze(&self, text: &str, preserve: &PreserveSet) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut result = apply_rules(text, &REWRITES, preserve);

        if self.aggressiveness >= Aggressiveness::Medium {
            for (verb, regex) in ARTICLE_RULES.iter() {
                if preserve.contains(verb) {
                    continue;
                }
                result = replace_unprotected(regex, &result, preserve, |caps: &Captures| {
                    if preserve.contains(&caps[2]) {
                        caps[0].to_string()
                    } else {
                        caps[1].to_string()
                    }
                });
            }
        }

        if self.aggressiveness >= Aggressiveness::High {
            result = apply_rules(&result, &PRONOUNS, preserve);
        }

        tidy_spacing(&result)
    }
}

fn apply_rules(text: &str, rules: &[RewriteRule], preserve: &PreserveSet) -> String {
    let mut result = text.to_string();
    for rule in rules {
        if preserve.guards_phrase(rule.pattern) {
            continue;
        }
        result = replace_unprotected(&rule.regex, &result, preserve, |caps: &Captures| {
            match_case(&caps[0], rule.replacement)
        });
    }
    result
}
