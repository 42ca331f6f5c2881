//! Sentence-level redundancy: `1 - mean pairwise cosine similarity`.

use std::collections::HashSet;

use rand::seq::index;
use rand::Rng;

use super::embedding::{EmbeddingError, EmbeddingService};
use crate::scoring::{DegradedReason, Measured};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub const DEFAULT_MAX_SENTENCES: usize = 50;
/// Value used when neither embeddings nor the lexical estimate are available.
pub const DUPLICATION_FALLBACK: f64 = 0.5;

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Jaccard similarity of the two character sets, whitespace ignored.
pub fn char_jaccard(a: &str, b: &str) -> Option<f64> {
    let set_a: HashSet<char> = a.chars().filter(|c| !c.is_whitespace()).collect();
    let set_b: HashSet<char> = b.chars().filter(|c| !c.is_whitespace()).collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return None;
    }
    Some(set_a.intersection(&set_b).count() as f64 / union as f64)
}

/// Score sentence diversity. Fewer than two sentences cannot duplicate each
/// other and score exactly 1.0. Above `max_sentences` a uniform subsample
/// drawn from `rng` is used.
pub fn duplication_score<S, R>(
    sentences: &[S],
    embeddings: &EmbeddingService,
    max_sentences: usize,
    rng: &mut R,
) -> Measured
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    if sentences.len() < 2 {
        return Measured::exact(1.0);
    }

    let limit = max_sentences.max(2);
    let selected: Vec<&str> = if sentences.len() > limit {
        log_debug!("sampling {limit} of {} sentences", sentences.len());
        let mut picked = index::sample(rng, sentences.len(), limit).into_vec();
        picked.sort_unstable();
        picked.into_iter().map(|i| sentences[i].as_ref()).collect()
    } else {
        sentences.iter().map(|s| s.as_ref()).collect()
    };

    match embeddings.encode(&selected) {
        Ok(vectors) => Measured::exact(1.0 - mean_pairwise_similarity(&vectors)),
        Err(err) => {
            let reason = match err {
                EmbeddingError::Unavailable(_) => DegradedReason::EmbeddingUnavailable,
                EmbeddingError::Encode(_) => DegradedReason::EmbeddingFailed,
            };
            log_warn!("{err}; estimating duplication lexically");
            lexical_estimate(&selected, reason)
        }
    }
}

/// Mean cosine similarity over the strict upper triangle.
fn mean_pairwise_similarity(vectors: &[Vec<f32>]) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;

    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            total += cosine_similarity(&vectors[i], &vectors[j]);
            pairs += 1;
        }
    }

    if pairs == 0 {
        0.0
    } else {
        total / pairs as f64
    }
}

/// Every sentence compared against the first one.
fn lexical_estimate(sentences: &[&str], reason: DegradedReason) -> Measured {
    let Some((first, rest)) = sentences.split_first() else {
        return Measured::degraded(DUPLICATION_FALLBACK, DegradedReason::LexicalFallbackFailed);
    };

    let similarities: Vec<f64> = rest
        .iter()
        .filter_map(|sentence| char_jaccard(first, sentence))
        .collect();

    if similarities.is_empty() {
        return Measured::degraded(DUPLICATION_FALLBACK, DegradedReason::LexicalFallbackFailed);
    }

    let mean = similarities.iter().sum::<f64>() / similarities.len() as f64;
    Measured::degraded(1.0 - mean, reason)
}
