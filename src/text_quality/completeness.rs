use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use super::sentences::char_len;

pub const DEFAULT_MIN_SENTENCE_LENGTH: usize = 10;

struct IncompletePatterns {
    trailing_ellipsis: Regex,
    bare_marker: Regex,
    question_ending: Regex,
}

fn incomplete_patterns() -> &'static IncompletePatterns {
    static PATTERNS: OnceLock<IncompletePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).expect("completeness pattern is valid");
        IncompletePatterns {
            trailing_ellipsis: compile(r"(?:\.{3}|…)\s*$"),
            // trailing word is a noun plus a subject/topic marker, no predicate
            bare_marker: compile(r"(?:^|\s)[가-힣]+(?:이|가|은|는)$"),
            // interrogative predicates such as 최선인가, 하는가, 좋은가
            question_ending: compile(r"[가-힣](?:인|는|은|던)가$"),
        }
    })
}

impl IncompletePatterns {
    fn matches(&self, sentence: &str) -> bool {
        self.trailing_ellipsis.is_match(sentence)
            || (self.bare_marker.is_match(sentence) && !self.question_ending.is_match(sentence))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompletenessReport {
    pub meaningful: usize,
    pub total: usize,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct CompletenessChecker {
    min_sentence_length: usize,
}

impl Default for CompletenessChecker {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SENTENCE_LENGTH)
    }
}

impl CompletenessChecker {
    pub fn new(min_sentence_length: usize) -> Self {
        Self { min_sentence_length }
    }

    pub fn is_meaningful(&self, sentence: &str) -> bool {
        char_len(sentence) >= self.min_sentence_length
            && !incomplete_patterns().matches(sentence)
    }

    /// Ratio of meaningful sentences, 0.0 when there are none at all.
    pub fn check<S: AsRef<str>>(&self, sentences: &[S]) -> CompletenessReport {
        let total = sentences.len();
        let meaningful = sentences
            .iter()
            .filter(|s| self.is_meaningful(s.as_ref()))
            .count();

        let score = if total == 0 {
            0.0
        } else {
            (meaningful as f64 / total as f64).min(1.0)
        };

        CompletenessReport {
            meaningful,
            total,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_quality::sentences::split_sentences;

    #[test]
    fn test_korean_sample_is_complete() {
        let sentences = split_sentences("이것은 샘플 텍스트입니다. 오늘 날씨가 좋습니다.");
        let report = CompletenessChecker::default().check(&sentences);
        assert_eq!(report.meaningful, 2);
        assert_eq!(report.total, 2);
        assert_eq!(report.score, 1.0);
    }

    #[test]
    fn test_short_sentences_are_not_meaningful() {
        let checker = CompletenessChecker::default();
        assert!(!checker.is_meaningful("짧은 문장"));
        assert!(!checker.is_meaningful("Too short"));
        assert!(checker.is_meaningful("This one is long enough."));
    }

    #[test]
    fn test_incomplete_patterns() {
        let checker = CompletenessChecker::default();
        assert!(!checker.is_meaningful("그래서 우리는 결국 그곳에..."));
        assert!(!checker.is_meaningful("and then it all went…"));
        assert!(!checker.is_meaningful("어제 회의에서 나온 결론은"));
        assert!(checker.is_meaningful("어제 회의에서 결론이 나왔습니다"));
    }

    #[test]
    fn test_questions_are_complete() {
        let checker = CompletenessChecker::default();
        assert!(checker.is_meaningful("그렇다면 무엇이 문제인가"));
        assert!(checker.is_meaningful("우리는 왜 이 길을 가야 하는가"));
        assert!(!checker.is_meaningful("그렇다면 이번 문제의 원인은"));

        let sentences = split_sentences("이 방법이 정말 최선인가? 우리는 더 나은 답을 찾았습니다.");
        let report = checker.check(&sentences);
        assert_eq!(report.meaningful, 2);
        assert_eq!(report.score, 1.0);
    }

    #[test]
    fn test_mixed_report() {
        let sentences = ["완전한 문장이 여기에 있습니다", "짧다", "이어지는 문장이 끊기면..."];
        let report = CompletenessChecker::default().check(&sentences);
        assert_eq!(report.meaningful, 1);
        assert!((report.score - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_sentences() {
        let empty: [&str; 0] = [];
        assert_eq!(CompletenessChecker::default().check(&empty).score, 0.0);
    }
}
