//! Pattern-based error density.
//!
//! Defects are collected from the rule tables, weighted, and normalized by
//! word count. Very small error counts are dampened so that a near-perfect
//! short text is not dragged down by a single slip.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::rules::{
    RuleCategory, RuleEntry, DATE_FORMATS, DATE_FORMAT_WEIGHT, INAPPROPRIATE_WORDS,
    KNOWN_ABBREVIATIONS, MIXED_SCRIPT_PATTERN, MIXED_SCRIPT_WEIGHT, NUMBERED_LIST_PATTERN,
    NUMBERED_LIST_WEIGHT, PATTERN_RULES, REPEATED_TOKEN_WEIGHT, SPELLING_WEIGHT,
};
use super::spellcheck::{is_hangul_syllable, SpellCheckHooks};
use crate::scoring::DegradedReason;

/// Weighted error count at or below which the ratio is halved.
const DAMPENING_MAX_ERRORS: f64 = 2.0;
const DAMPENING_FACTOR: f64 = 0.5;
/// Lowest accuracy a non-empty text can score.
const ACCURACY_FLOOR: f64 = 0.05;
/// Texts longer than this (non-space chars) with little Hangul are penalized.
const LANGUAGE_CHECK_MIN_CHARS: usize = 50;
const MIN_HANGUL_RATIO: f64 = 0.3;
const LANGUAGE_PENALTY: f64 = 0.9;

struct CompiledRules {
    patterns: Vec<(Regex, RuleEntry)>,
    mixed_script: Regex,
    numbered_list: Regex,
    dates: Vec<(&'static str, Regex)>,
    latin_blocklist: Option<Regex>,
    latin_weights: HashMap<String, f64>,
    hangul_blocklist: Vec<(&'static str, f64)>,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("rule table patterns are valid")
}

fn compiled() -> &'static CompiledRules {
    static RULES: OnceLock<CompiledRules> = OnceLock::new();
    RULES.get_or_init(|| {
        let (latin, hangul): (Vec<(&str, f64)>, Vec<(&str, f64)>) = INAPPROPRIATE_WORDS
            .iter()
            .partition(|(word, _)| word.chars().all(|c| c.is_ascii_alphabetic()));

        let latin_blocklist = (!latin.is_empty()).then(|| {
            let alternatives: Vec<String> = latin.iter().map(|(w, _)| regex::escape(w)).collect();
            compile(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
        });

        CompiledRules {
            patterns: PATTERN_RULES
                .iter()
                .map(|entry| (compile(entry.pattern), *entry))
                .collect(),
            mixed_script: compile(MIXED_SCRIPT_PATTERN),
            numbered_list: compile(NUMBERED_LIST_PATTERN),
            dates: DATE_FORMATS
                .iter()
                .map(|(name, pattern)| (*name, compile(pattern)))
                .collect(),
            latin_blocklist,
            latin_weights: latin.iter().map(|(w, weight)| (w.to_string(), *weight)).collect(),
            hangul_blocklist: hangul,
        }
    })
}

/// Per-text accuracy details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub score: f64,
    pub error_weight: f64,
    pub word_count: usize,
    pub hangul_ratio: f64,
    pub by_category: BTreeMap<RuleCategory, f64>,
    pub degraded: Vec<DegradedReason>,
}

#[derive(Debug, Clone, Default)]
pub struct AccuracyChecker {
    spellcheck: SpellCheckHooks,
}

impl AccuracyChecker {
    pub fn new(spellcheck: SpellCheckHooks) -> Self {
        Self { spellcheck }
    }

    pub fn check(&self, text: &str) -> AccuracyReport {
        if text.is_empty() {
            return AccuracyReport {
                score: 0.0,
                error_weight: 0.0,
                word_count: 0,
                hangul_ratio: 0.0,
                by_category: BTreeMap::new(),
                degraded: vec![DegradedReason::EmptyInput],
            };
        }

        let rules = compiled();
        let mut by_category: BTreeMap<RuleCategory, f64> = BTreeMap::new();
        let mut add = |category: RuleCategory, weight: f64| {
            if weight > 0.0 {
                *by_category.entry(category).or_insert(0.0) += weight;
            }
        };

        for (regex, entry) in &rules.patterns {
            add(entry.category, regex.find_iter(text).count() as f64 * entry.weight);
        }

        add(
            RuleCategory::MixedScript,
            count_mixed_script(&rules.mixed_script, text) as f64 * MIXED_SCRIPT_WEIGHT,
        );
        add(
            RuleCategory::RepeatedToken,
            count_repeated_tokens(text) as f64 * REPEATED_TOKEN_WEIGHT,
        );
        add(RuleCategory::Inappropriate, inappropriate_weight(rules, text));
        add(
            RuleCategory::NumberedList,
            count_duplicate_list_numbers(&rules.numbered_list, text) as f64 * NUMBERED_LIST_WEIGHT,
        );
        add(
            RuleCategory::DateFormat,
            count_mixed_date_formats(&rules.dates, text) as f64 * DATE_FORMAT_WEIGHT,
        );

        let spelling = self.spellcheck.check(text);
        add(RuleCategory::Spelling, spelling.errors as f64 * SPELLING_WEIGHT);

        let error_weight: f64 = by_category.values().sum();
        let word_count = text.split_whitespace().count();
        let hangul_ratio = hangul_ratio(text);
        let non_space = text.chars().filter(|c| !c.is_whitespace()).count();

        let score = accuracy_from_errors(error_weight, word_count, hangul_ratio, non_space);

        AccuracyReport {
            score,
            error_weight,
            word_count,
            hangul_ratio,
            by_category,
            degraded: spelling.degraded,
        }
    }
}

/// Turn a weighted error count into an accuracy score.
pub fn accuracy_from_errors(
    error_weight: f64,
    word_count: usize,
    hangul_ratio: f64,
    non_space_chars: usize,
) -> f64 {
    let mut ratio = (error_weight / word_count.max(1) as f64).min(1.0);
    if error_weight <= DAMPENING_MAX_ERRORS {
        ratio *= DAMPENING_FACTOR;
    }

    let mut score = 1.0 - ratio;
    if hangul_ratio < MIN_HANGUL_RATIO && non_space_chars > LANGUAGE_CHECK_MIN_CHARS {
        score *= LANGUAGE_PENALTY;
    }

    score.clamp(ACCURACY_FLOOR, 1.0)
}

/// Hangul syllables over non-whitespace characters.
pub fn hangul_ratio(text: &str) -> f64 {
    let (hangul, total) = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .fold((0usize, 0usize), |(h, t), c| (h + is_hangul_syllable(c) as usize, t + 1));
    hangul as f64 / total.max(1) as f64
}

fn count_mixed_script(regex: &Regex, text: &str) -> usize {
    regex
        .captures_iter(text)
        .filter(|caps| {
            let latin = &caps[1];
            !KNOWN_ABBREVIATIONS
                .iter()
                .any(|abbr| abbr.eq_ignore_ascii_case(latin))
        })
        .count()
}

/// Same token twice in a row, ignoring case and surrounding punctuation.
/// Pure numbers are skipped (`1 1` in tables is not a typo).
fn count_repeated_tokens(text: &str) -> usize {
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .collect();

    tokens
        .windows(2)
        .filter(|pair| {
            !pair[0].is_empty()
                && pair[0] == pair[1]
                && !pair[0].chars().all(|c| c.is_ascii_digit())
        })
        .count()
}

fn inappropriate_weight(rules: &CompiledRules, text: &str) -> f64 {
    let latin: f64 = rules
        .latin_blocklist
        .as_ref()
        .map(|regex| {
            regex
                .find_iter(text)
                .filter_map(|m| rules.latin_weights.get(&m.as_str().to_ascii_lowercase()))
                .sum()
        })
        .unwrap_or(0.0);

    let hangul: f64 = rules
        .hangul_blocklist
        .iter()
        .map(|(word, weight)| text.matches(word).count() as f64 * weight)
        .sum();

    latin + hangul
}

/// Extra occurrences of a list number already used in the same text.
fn count_duplicate_list_numbers(regex: &Regex, text: &str) -> usize {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for caps in regex.captures_iter(text) {
        if let Some(number) = caps.get(1) {
            *seen.entry(number.as_str()).or_insert(0) += 1;
        }
    }
    seen.values().map(|count| count.saturating_sub(1)).sum()
}

/// One defect per date-format family beyond the first.
fn count_mixed_date_formats(dates: &[(&'static str, Regex)], text: &str) -> usize {
    let families = dates.iter().filter(|(_, regex)| regex.is_match(text)).count();
    families.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> AccuracyChecker {
        AccuracyChecker::default()
    }

    const CLEAN_KOREAN: &str = "인공지능 기술은 다양한 산업 분야에서 빠르게 발전하고 있습니다. \
        특히 의료 분야에서는 질병의 조기 진단에 큰 도움을 주고 있습니다. \
        앞으로도 많은 연구가 이루어질 것으로 기대됩니다.";

    #[test]
    fn test_clean_korean_paragraph() {
        let report = checker().check(CLEAN_KOREAN);
        assert_eq!(report.error_weight, 0.0, "{:?}", report.by_category);
        assert!(report.score >= 0.9);
        assert!(report.hangul_ratio > 0.9);
    }

    #[test]
    fn test_spacing_and_blank_lines() {
        let report = checker().check("첫 줄입니다.  공백이 두 칸입니다.\n\n\n세 번째 줄입니다.");
        assert_eq!(report.by_category.get(&RuleCategory::Spacing), Some(&1.0));
        assert_eq!(report.by_category.get(&RuleCategory::BlankLines), Some(&1.0));
    }

    #[test]
    fn test_blank_lines_with_crlf() {
        let report = checker().check("첫 줄입니다.\r\n\r\n\r\n세 번째 줄입니다.");
        assert_eq!(report.by_category.get(&RuleCategory::BlankLines), Some(&1.0));
    }

    #[test]
    fn test_mixed_script_respects_abbreviations() {
        let rules = compiled();
        assert_eq!(count_mixed_script(&rules.mixed_script, "데이터set입니다"), 1);
        assert_eq!(count_mixed_script(&rules.mixed_script, "최신AI기술"), 0);
        assert_eq!(count_mixed_script(&rules.mixed_script, "데이터 set 입니다"), 0);
    }

    #[test]
    fn test_repeated_tokens() {
        assert_eq!(count_repeated_tokens("the the cat sat"), 1);
        assert_eq!(count_repeated_tokens("The, the cat"), 1);
        assert_eq!(count_repeated_tokens("score 1 1 2"), 0);
        assert_eq!(count_repeated_tokens("no repeats here"), 0);
    }

    #[test]
    fn test_blocklist_weights() {
        let report = checker().check("You are a stupid idiot and 바보 indeed");
        assert_eq!(report.by_category.get(&RuleCategory::Inappropriate), Some(&3.0));

        // word boundaries: "classic" and "scrapbook" contain no blocked word
        let report = checker().check("a classic scrapbook story");
        assert!(report.by_category.get(&RuleCategory::Inappropriate).is_none());
    }

    #[test]
    fn test_numbered_list_duplicates() {
        let rules = compiled();
        let text = "1. 준비\n2. 실행\n2. 정리\n3. 보고";
        assert_eq!(count_duplicate_list_numbers(&rules.numbered_list, text), 1);
    }

    #[test]
    fn test_mixed_date_formats() {
        let rules = compiled();
        assert_eq!(count_mixed_date_formats(&rules.dates, "2024-01-05 and 2024-02-01"), 0);
        assert_eq!(count_mixed_date_formats(&rules.dates, "2024-01-05 그리고 2024년 2월 1일"), 1);
        assert_eq!(
            count_mixed_date_formats(&rules.dates, "2024-01-05, 2024/02/01, 2024.03.04"),
            2
        );
    }

    #[test]
    fn test_hedging_phrases() {
        let report = checker().check("그 결과는 아마 확실히 맞을 것입니다");
        assert_eq!(report.by_category.get(&RuleCategory::Hedging), Some(&1.0));
    }

    #[test]
    fn test_dampening_and_floor() {
        // one error in ten words: 0.1 halved
        assert!((accuracy_from_errors(1.0, 10, 1.0, 30) - 0.95).abs() < 1e-12);
        // three errors in ten words: no dampening
        assert!((accuracy_from_errors(3.0, 10, 1.0, 30) - 0.7).abs() < 1e-12);
        // saturated
        assert_eq!(accuracy_from_errors(50.0, 10, 1.0, 30), ACCURACY_FLOOR);
    }

    #[test]
    fn test_language_penalty() {
        let english = "This paragraph is written entirely in English and is clearly longer than fifty characters.";
        let report = checker().check(english);
        assert_eq!(report.error_weight, 0.0);
        assert!((report.score - 0.9).abs() < 1e-12);

        // short Latin text escapes the penalty
        assert_eq!(checker().check("Short and clean.").score, 1.0);
    }

    #[test]
    fn test_empty_text_scores_zero() {
        assert_eq!(checker().check("").score, 0.0);
    }
}
