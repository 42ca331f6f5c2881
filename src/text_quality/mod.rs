//! Single-text quality analysis: accuracy, sentence duplication and
//! completeness.

pub mod accuracy;
pub mod completeness;
pub mod duplication;
pub mod embedding;
pub mod rules;
pub mod sentences;
pub mod spellcheck;

pub use accuracy::{AccuracyChecker, AccuracyReport};
pub use completeness::{CompletenessChecker, CompletenessReport};
pub use embedding::{
    EmbeddingError, EmbeddingService, EmbeddingSettings, EncoderLoader, SentenceEncoder,
};
pub use spellcheck::{SpellCheckHooks, SpellChecker};

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::scoring::{DegradedReason, Measured, Metric, MetricSet, MetricValue};

/// Tunables for the text analyzer.
#[derive(Debug, Clone)]
pub struct TextConfig {
    /// Sentences compared for duplication before subsampling kicks in
    pub max_sentences: usize,

    /// Shorter sentences do not count as meaningful
    pub min_sentence_length: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            max_sentences: duplication::DEFAULT_MAX_SENTENCES,
            min_sentence_length: completeness::DEFAULT_MIN_SENTENCE_LENGTH,
        }
    }
}

/// Everything measured on one text.
#[derive(Debug, Clone, Serialize)]
pub struct TextQuality {
    pub metrics: MetricSet,
    pub sentence_count: usize,
    pub accuracy: AccuracyReport,
    pub duplication: Measured,
    pub completeness: CompletenessReport,
    pub degradations: Vec<DegradedReason>,
}

#[derive(Debug, Clone)]
pub struct TextAnalyzer {
    config: TextConfig,
    accuracy: AccuracyChecker,
    completeness: CompletenessChecker,
    embeddings: Arc<EmbeddingService>,
}

impl Default for TextAnalyzer {
    fn default() -> Self {
        Self::new(
            TextConfig::default(),
            EmbeddingService::shared(),
            SpellCheckHooks::default(),
        )
    }
}

impl TextAnalyzer {
    pub fn new(
        config: TextConfig,
        embeddings: Arc<EmbeddingService>,
        spellcheck: SpellCheckHooks,
    ) -> Self {
        Self {
            completeness: CompletenessChecker::new(config.min_sentence_length),
            accuracy: AccuracyChecker::new(spellcheck),
            config,
            embeddings,
        }
    }

    pub fn config(&self) -> &TextConfig {
        &self.config
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingService> {
        &self.embeddings
    }

    /// Score one text. Sentence subsampling draws from OS entropy.
    pub fn analyze(&self, text: &str) -> MetricSet {
        self.analyze_with_rng(text, &mut StdRng::from_entropy())
    }

    pub fn analyze_with_rng<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> MetricSet {
        self.inspect_with_rng(text, rng).metrics
    }

    /// Score one text and keep the per-check details. Blank text scores 0.0 on
    /// every metric.
    pub fn inspect_with_rng<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> TextQuality {
        let sentences = sentences::split_sentences(text);

        if text.trim().is_empty() || sentences.is_empty() {
            return self.blank_quality();
        }

        let accuracy = self.accuracy.check(text);
        let duplication = duplication::duplication_score(
            &sentences,
            &self.embeddings,
            self.config.max_sentences,
            rng,
        );
        let completeness = self.completeness.check(&sentences);

        let mut metrics = MetricSet::new();
        metrics.set_score(Metric::Accuracy, accuracy.score);
        metrics.set_score(Metric::Duplication, duplication.value());
        metrics.set_score(Metric::Completeness, completeness.score);

        let mut degradations = accuracy.degraded.clone();
        degradations.extend(duplication.degraded_reason());

        TextQuality {
            metrics,
            sentence_count: sentences.len(),
            accuracy,
            duplication,
            completeness,
            degradations,
        }
    }

    fn blank_quality(&self) -> TextQuality {
        let metrics = [Metric::Accuracy, Metric::Duplication, Metric::Completeness]
            .into_iter()
            .map(|metric| (metric, MetricValue::Score(0.0)))
            .collect();

        TextQuality {
            metrics,
            sentence_count: 0,
            accuracy: self.accuracy.check(""),
            duplication: Measured::degraded(0.0, DegradedReason::EmptyInput),
            completeness: self.completeness.check::<&str>(&[]),
            degradations: vec![DegradedReason::EmptyInput],
        }
    }
}

/// Score one text with the default analyzer. The bundled embedding model is
/// shared across calls.
pub fn analyze_text(text: &str) -> MetricSet {
    TextAnalyzer::default().analyze(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::calc_total_score;

    fn analyzer() -> TextAnalyzer {
        TextAnalyzer::default()
    }

    #[test]
    fn test_blank_text_scores_zero() {
        for text in ["", "   ", "\n\t\n"] {
            let metrics = analyzer().analyze_with_rng(text, &mut StdRng::seed_from_u64(0));
            assert_eq!(metrics.len(), 3);
            assert_eq!(metrics.score(Metric::Accuracy), Some(0.0));
            assert_eq!(metrics.score(Metric::Duplication), Some(0.0));
            assert_eq!(metrics.score(Metric::Completeness), Some(0.0));
            assert_eq!(calc_total_score(&metrics), 0.0);
        }
    }

    #[test]
    fn test_korean_sample() {
        let quality = analyzer().inspect_with_rng(
            "이것은 샘플 텍스트입니다. 오늘 날씨가 좋습니다.",
            &mut StdRng::seed_from_u64(0),
        );

        assert_eq!(quality.sentence_count, 2);
        assert_eq!(quality.completeness.meaningful, 2);
        assert_eq!(quality.metrics.score(Metric::Completeness), Some(1.0));
        assert!(quality.metrics.score(Metric::Accuracy).unwrap() >= 0.9);
    }

    #[test]
    fn test_single_sentence_duplication_is_one() {
        let metrics = analyzer().analyze_with_rng(
            "한 문장으로만 이루어진 텍스트입니다",
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(metrics.score(Metric::Duplication), Some(1.0));
    }

    #[test]
    fn test_repetitive_text_has_low_duplication_score() {
        let text = "같은 말을 반복합니다.\n같은 말을 반복합니다.\n같은 말을 반복합니다.";
        let metrics = analyzer().analyze_with_rng(text, &mut StdRng::seed_from_u64(0));
        assert!(metrics.score(Metric::Duplication).unwrap() < 0.01);
    }

    #[test]
    fn test_shared_embedding_service_is_initialized_once() {
        let service = Arc::new(EmbeddingService::default());
        let a = TextAnalyzer::new(TextConfig::default(), Arc::clone(&service), SpellCheckHooks::new());
        let b = TextAnalyzer::new(TextConfig::default(), Arc::clone(&service), SpellCheckHooks::new());

        assert!(!service.is_ready());
        a.analyze_with_rng("첫 번째 문장입니다. 두 번째 문장입니다.", &mut StdRng::seed_from_u64(0));
        assert!(service.is_ready());
        assert!(b.embeddings().is_ready());
    }

    #[test]
    fn test_default_analyzers_share_the_process_model() {
        let a = TextAnalyzer::default();
        let b = TextAnalyzer::default();
        assert!(Arc::ptr_eq(a.embeddings(), b.embeddings()));

        analyze_text("첫 번째 문장입니다. 두 번째 문장입니다.");
        assert!(EmbeddingService::shared().is_ready());
        assert!(a.embeddings().is_ready());
    }

    #[test]
    fn test_metrics_in_unit_range() {
        let text = "This  is   badly spaced text text with 2024-01-01 and 2024/01/02 dates...\n\n\n\nMore lines";
        let metrics = analyzer().analyze_with_rng(text, &mut StdRng::seed_from_u64(3));
        for (_, value) in metrics.iter() {
            let score = value.as_score().unwrap();
            assert!((0.0..=1.0).contains(&score));
        }
    }
}
