//! Pluggable spell-check backends, one per script.
//!
//! Dictionary-based checkers (hunspell bindings, remote Korean checkers) plug
//! in through [`SpellChecker`]. When a script has no backend, or the backend
//! fails, the built-in misspelling tables from [`super::rules`] are used and
//! the result is tagged as degraded.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::rules::{KOREAN_MISSPELLINGS, LATIN_MISSPELLINGS};
use crate::scoring::DegradedReason;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    Latin,
    Hangul,
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Script::Latin => f.write_str("latin"),
            Script::Hangul => f.write_str("hangul"),
        }
    }
}

impl Script {
    /// Whether the text contains any letter of this script.
    pub fn occurs_in(&self, text: &str) -> bool {
        match self {
            Script::Latin => text.chars().any(|c| c.is_ascii_alphabetic()),
            Script::Hangul => text.chars().any(is_hangul_syllable),
        }
    }
}

pub fn is_hangul_syllable(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

/// A spell-check backend for one script.
pub trait SpellChecker: Send + Sync {
    fn name(&self) -> &str;

    /// Number of misspelled words in `text`.
    fn count_errors(&self, text: &str) -> anyhow::Result<usize>;
}

/// Built-in checker: counts occurrences of known misspellings.
#[derive(Debug, Clone, Copy)]
pub struct DictionarySpellChecker {
    script: Script,
}

impl DictionarySpellChecker {
    pub fn new(script: Script) -> Self {
        Self { script }
    }

    fn count(&self, text: &str) -> usize {
        match self.script {
            Script::Latin => text
                .split(|c: char| !c.is_ascii_alphabetic())
                .filter(|w| !w.is_empty())
                .map(|w| w.to_ascii_lowercase())
                .filter(|w| LATIN_MISSPELLINGS.contains(&w.as_str()))
                .count(),
            Script::Hangul => KOREAN_MISSPELLINGS
                .iter()
                .map(|typo| text.matches(typo).count())
                .sum(),
        }
    }
}

impl SpellChecker for DictionarySpellChecker {
    fn name(&self) -> &str {
        match self.script {
            Script::Latin => "builtin-latin-typos",
            Script::Hangul => "builtin-hangul-typos",
        }
    }

    fn count_errors(&self, text: &str) -> anyhow::Result<usize> {
        Ok(self.count(text))
    }
}

/// Result of running the spelling hooks over one text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpellingOutcome {
    pub errors: usize,
    pub degraded: Vec<DegradedReason>,
}

/// Backends per script. A missing backend means the built-in table is used.
#[derive(Clone, Default)]
pub struct SpellCheckHooks {
    latin: Option<Arc<dyn SpellChecker>>,
    hangul: Option<Arc<dyn SpellChecker>>,
}

impl fmt::Debug for SpellCheckHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpellCheckHooks")
            .field("latin", &self.latin.as_ref().map(|c| c.name().to_string()))
            .field("hangul", &self.hangul.as_ref().map(|c| c.name().to_string()))
            .finish()
    }
}

impl SpellCheckHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latin(mut self, checker: Arc<dyn SpellChecker>) -> Self {
        log_info!("latin spell-check backend: {}", checker.name());
        self.latin = Some(checker);
        self
    }

    pub fn with_hangul(mut self, checker: Arc<dyn SpellChecker>) -> Self {
        log_info!("hangul spell-check backend: {}", checker.name());
        self.hangul = Some(checker);
        self
    }

    pub fn has_backend(&self, script: Script) -> bool {
        self.backend(script).is_some()
    }

    fn backend(&self, script: Script) -> Option<&Arc<dyn SpellChecker>> {
        match script {
            Script::Latin => self.latin.as_ref(),
            Script::Hangul => self.hangul.as_ref(),
        }
    }

    /// Count misspellings for every script present in the text.
    pub fn check(&self, text: &str) -> SpellingOutcome {
        let mut outcome = SpellingOutcome::default();

        for script in [Script::Latin, Script::Hangul] {
            if !script.occurs_in(text) {
                continue;
            }

            let from_backend = self.backend(script).and_then(|checker| {
                checker
                    .count_errors(text)
                    .map_err(|err| {
                        log_warn!("{script} spell-check backend {} failed: {err:#}", checker.name());
                    })
                    .ok()
            });

            match from_backend {
                Some(errors) => outcome.errors += errors,
                None => {
                    outcome.errors += DictionarySpellChecker::new(script).count(text);
                    if !outcome.degraded.contains(&DegradedReason::SpellCheckUnavailable) {
                        outcome.degraded.push(DegradedReason::SpellCheckUnavailable);
                    }
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedChecker(usize);

    impl SpellChecker for FixedChecker {
        fn name(&self) -> &str {
            "fixed"
        }

        fn count_errors(&self, _text: &str) -> anyhow::Result<usize> {
            Ok(self.0)
        }
    }

    struct BrokenChecker;

    impl SpellChecker for BrokenChecker {
        fn name(&self) -> &str {
            "broken"
        }

        fn count_errors(&self, _text: &str) -> anyhow::Result<usize> {
            anyhow::bail!("dictionary not installed")
        }
    }

    #[test]
    fn test_builtin_tables() {
        let latin = DictionarySpellChecker::new(Script::Latin);
        assert_eq!(latin.count("I recieve teh mail, Teh end."), 3);

        let hangul = DictionarySpellChecker::new(Script::Hangul);
        assert_eq!(hangul.count("몇일 뒤에 연락할께요."), 2);
    }

    #[test]
    fn test_missing_backend_is_degraded() {
        let outcome = SpellCheckHooks::new().check("teh cat");
        assert_eq!(outcome.errors, 1);
        assert_eq!(outcome.degraded, vec![DegradedReason::SpellCheckUnavailable]);
    }

    #[test]
    fn test_backends_take_precedence() {
        let hooks = SpellCheckHooks::new()
            .with_latin(Arc::new(FixedChecker(4)))
            .with_hangul(Arc::new(FixedChecker(1)));

        let outcome = hooks.check("teh 고양이");
        assert_eq!(outcome.errors, 5);
        assert!(outcome.degraded.is_empty());
    }

    #[test]
    fn test_failing_backend_falls_back() {
        let hooks = SpellCheckHooks::new().with_latin(Arc::new(BrokenChecker));
        let outcome = hooks.check("wierd text");
        assert_eq!(outcome.errors, 1);
        assert_eq!(outcome.degraded, vec![DegradedReason::SpellCheckUnavailable]);
    }

    #[test]
    fn test_absent_script_is_not_checked() {
        let hooks = SpellCheckHooks::new().with_hangul(Arc::new(FixedChecker(0)));
        let outcome = hooks.check("오늘은 맑습니다");
        assert_eq!(outcome.errors, 0);
        assert!(outcome.degraded.is_empty());
    }
}
