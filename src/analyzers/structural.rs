//! Structural normalization: whitespace and block formatting

use super::{replace_unprotected, Aggressiveness, Analyzer, PreserveSet};
use crate::config::ConfigError;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static RE_TRAILING_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());
static RE_BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_HSPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

// Level 2: compress
static RE_DEEP_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#{4,}[ \t]").unwrap());
static RE_LONG_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[-*_]{4,}[ \t]*$").unwrap());
static RE_HEAVY_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*{3,}([^*]+?)\*{3,}").unwrap());
static RE_HEAVY_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{3,}([^_]+?)_{3,}").unwrap());

// Level 3: strip
static RE_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+[ \t]+").unwrap());
static RE_RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[-*_]{3,}[ \t]*$").unwrap());
static RE_STAR_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*{1,3}([^*\n]+?)\*{1,3}").unwrap());
static RE_UNDERSCORE_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b_{1,3}([^_\n]+?)_{1,3}\b").unwrap());
static RE_INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+?)`").unwrap());
static RE_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*?)\]\([^)]+?\)").unwrap());
static RE_LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+?)\]\([^)]+?\)").unwrap());
static RE_BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+(.+)$").unwrap());
static RE_NUMBERED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s+(.+)$").unwrap());

/// Normalizes whitespace, collapses blank lines, and optionally simplifies
/// or strips markdown formatting.
#[derive(Debug, Clone)]
pub struct StructuralAnalyzer {
    aggressiveness: Aggressiveness,
}

impl StructuralAnalyzer {
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

impl Default for StructuralAnalyzer {
    fn default() -> Self {
        Self::with_level(Aggressiveness::Low)
    }
}

impl Analyzer for StructuralAnalyzer {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn analyze(&self, text: &str, preserve: &PreserveSet) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut result = normalize_whitespace(text);

        if self.aggressiveness >= Aggressiveness::Medium {
            result = compress_markdown(&result, preserve);
        }

        if self.aggressiveness >= Aggressiveness::High {
            result = strip_markdown(&result, preserve);
        }

        normalize_whitespace(&result)
    }
}

/// Trim line ends, keep at most one blank line, single-space runs, trim.
pub fn normalize_whitespace(text: &str) -> String {
    let result = RE_TRAILING_WS.replace_all(text, "");
    let result = RE_BLANK_RUN.replace_all(&result, "\n\n");
    let result = RE_HSPACE_RUN.replace_all(&result, " ");
    result.trim().to_string()
}

fn compress_markdown(text: &str, preserve: &PreserveSet) -> String {
    let rules: [(&Regex, &str); 4] = [
        (&*RE_DEEP_HEADER, "### "),
        (&*RE_LONG_RULE, "---"),
        (&*RE_HEAVY_STARS, "**${1}**"),
        (&*RE_HEAVY_UNDERSCORES, "__${1}__"),
    ];
    apply_templates(text, &rules, preserve)
}

fn strip_markdown(text: &str, preserve: &PreserveSet) -> String {
    let rules: [(&Regex, &str); 7] = [
        (&*RE_HEADER, ""),
        (&*RE_RULE, ""),
        (&*RE_STAR_EMPHASIS, "${1}"),
        (&*RE_UNDERSCORE_EMPHASIS, "${1}"),
        (&*RE_INLINE_CODE, "${1}"),
        (&*RE_IMAGE, "${1}"),
        (&*RE_LINK, "${1}"),
    ];
    let result = apply_templates(text, &rules, preserve);

    flatten_lists(&result, preserve)
}

fn apply_templates(text: &str, rules: &[(&Regex, &str)], preserve: &PreserveSet) -> String {
    let mut result = text.to_string();
    for (regex, template) in rules {
        result = replace_unprotected(regex, &result, preserve, |caps: &Captures| {
            let mut expanded = String::new();
            caps.expand(template, &mut expanded);
            expanded
        });
    }
    result
}

/// Each contiguous run of bullet or numbered items becomes one
/// comma-separated line. A line whose marker is part of a preserved keyword
/// is not treated as an item.
fn flatten_lists(text: &str, preserve: &PreserveSet) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut items: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        let spans = preserve.protected_spans(line);
        let item = RE_BULLET
            .captures(line)
            .or_else(|| RE_NUMBERED.captures(line))
            .and_then(|caps| caps.get(1))
            .filter(|item| !spans.overlaps(0..item.start()));

        match item {
            Some(item) => items.push(item.as_str().trim()),
            None => {
                if !items.is_empty() {
                    lines.push(items.join(", "));
                    items.clear();
                }
                lines.push(line.to_string());
            }
        }
    }

    if !items.is_empty() {
        lines.push(items.join(", "));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(level: u8, text: &str) -> String {
        StructuralAnalyzer::new(level)
            .unwrap()
            .analyze(text, &PreserveSet::new())
    }

    #[test]
    fn test_collapses_blank_lines() {
        let result = run(1, "line 1\n\n\n\nline 2");
        assert_eq!(result, "line 1\n\nline 2");
    }

    #[test]
    fn test_collapses_spaces() {
        let result = run(1, "too   many \t  spaces");
        assert_eq!(result, "too many spaces");
    }

    #[test]
    fn test_trims_trailing_whitespace() {
        let result = run(1, "line 1   \nline 2  ");
        for line in result.split('\n') {
            assert_eq!(line, line.trim_end());
        }
        assert_eq!(result, "line 1\nline 2");
    }

    #[test]
    fn test_whitespace_only_lines_count_as_blank() {
        let result = run(1, "a\n \t\n\n\nb");
        assert_eq!(result, "a\n\nb");
    }

    #[test]
    fn test_level_1_leaves_markdown() {
        let text = "#### Deep header\n\n**bold**";
        assert_eq!(run(1, text), text);
    }

    #[test]
    fn test_compresses_markdown_at_level_2() {
        let result = run(2, "#### Deep header");
        assert!(result.starts_with("### "));

        assert_eq!(run(2, "above\n------\nbelow"), "above\n---\nbelow");
        assert_eq!(run(2, "****loud****"), "**loud**");
        assert_eq!(run(2, "___quiet___"), "__quiet__");
    }

    #[test]
    fn test_strips_markdown_at_level_3() {
        let result = run(3, "## Header\n\n**bold text**");
        assert!(!result.contains('#'));
        assert!(!result.contains("**"));
        assert_eq!(result, "Header\n\nbold text");
    }

    #[test]
    fn test_strips_inline_markup_at_level_3() {
        let text = "Call `parse()` as shown in [the docs](https://example.com) ![diagram](d.png)";
        assert_eq!(run(3, text), "Call parse() as shown in the docs diagram");
    }

    #[test]
    fn test_keeps_snake_case_identifiers() {
        assert_eq!(run(3, "use max_retry_count here"), "use max_retry_count here");
        assert_eq!(run(3, "an _emphasized_ word"), "an emphasized word");
    }

    #[test]
    fn test_converts_lists_to_csv_at_level_3() {
        let result = run(3, "- item one\n- item two\n- item three");
        assert_eq!(result, "item one, item two, item three");
    }

    #[test]
    fn test_non_list_line_flushes_items() {
        let text = "Steps:\n1. fetch\n2) parse\nThen:\n* report\n+ archive";
        assert_eq!(run(3, text), "Steps:\nfetch, parse\nThen:\nreport, archive");
    }

    #[test]
    fn test_rule_lines_removed_at_level_3() {
        assert_eq!(run(3, "above\n\n---\n\nbelow"), "above\n\nbelow");
    }

    #[test]
    fn test_preserved_markup_survives_stripping() {
        let analyzer = StructuralAnalyzer::new(3).unwrap();
        let preserve = PreserveSet::from_keywords(["__init__", "`cargo test`"]);

        let result = analyzer.analyze("Override __init__ here", &preserve);
        assert_eq!(result, "Override __init__ here");

        let result = analyzer.analyze("Run `cargo test` and **then** `cargo fmt`", &preserve);
        assert_eq!(result, "Run `cargo test` and then cargo fmt");
    }

    #[test]
    fn test_preserved_heavy_emphasis_survives_compression() {
        let analyzer = StructuralAnalyzer::new(2).unwrap();
        let preserve = PreserveSet::from_keywords(["***warning***"]);
        let result = analyzer.analyze("***warning*** and ***note***", &preserve);
        assert_eq!(result, "***warning*** and **note**");
    }

    #[test]
    fn test_preserved_marker_keeps_list_line() {
        let analyzer = StructuralAnalyzer::new(3).unwrap();
        let preserve = PreserveSet::from_keywords(["- [x]"]);
        let result = analyzer.analyze("- [x] done\n- open", &preserve);
        assert_eq!(result, "- [x] done\nopen");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(run(1, ""), "");
        assert_eq!(run(3, ""), "");
    }

    #[test]
    fn test_invalid_aggressiveness() {
        assert!(matches!(
            StructuralAnalyzer::new(0),
            Err(ConfigError::InvalidAggressiveness(0))
        ));
    }

    #[test]
    fn test_whitespace_normalization_is_idempotent() {
        let text = "  # Title  \n\n\n\nsome   text\t\there  \n- a\n- b\n\n\n";
        let once = normalize_whitespace(text);
        assert_eq!(normalize_whitespace(&once), once);
    }

    #[test]
    fn test_higher_levels_never_longer() {
        let text = "##### Setup\n\n-----\n\n***Important***: run `make`\n\n- one\n- two\n";
        let l1 = run(1, text);
        let l2 = run(2, text);
        let l3 = run(3, text);
        assert!(l2.len() <= l1.len());
        assert!(l3.len() <= l2.len());
    }

    proptest! {
        #[test]
        fn prop_level_1_is_idempotent(text in "[a-c \t\n#*-]{0,200}") {
            let once = run(1, &text);
            prop_assert_eq!(run(1, &once), once);
        }

        #[test]
        fn prop_total_over_any_text(text in "\\PC*", level in 1u8..=3) {
            let result = run(level, &text);
            prop_assert_eq!(result.trim(), result.as_str());
        }
    }
}
