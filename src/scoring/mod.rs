//! Metric vocabulary, metric sets and the score combiner.

pub mod grade;

pub use grade::{format_score, get_grade, Grade};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Fixed metric vocabulary shared by the image and text analyzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Resolution,
    Sharpness,
    Noise,
    Validity,
    Duplication,
    Accuracy,
    Completeness,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Resolution => "resolution",
            Metric::Sharpness => "sharpness",
            Metric::Noise => "noise",
            Metric::Validity => "validity",
            Metric::Duplication => "duplication",
            Metric::Accuracy => "accuracy",
            Metric::Completeness => "completeness",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric entry: a normalized score, or "N/A" when the metric cannot apply
/// (duplication of a lone image).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Score(f64),
    NotApplicable,
}

impl MetricValue {
    /// Build a score, clamped into [0, 1]. Non-finite input becomes 0.0.
    pub fn score(value: f64) -> Self {
        MetricValue::Score(clamp_unit(value))
    }

    pub fn as_score(&self) -> Option<f64> {
        match self {
            MetricValue::Score(v) => Some(*v),
            MetricValue::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, MetricValue::Score(_))
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Score(v) => write!(f, "{}", format_score(*v, 3)),
            MetricValue::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

const NOT_APPLICABLE: &str = "N/A";

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            MetricValue::Score(v) => serializer.serialize_f64(*v),
            MetricValue::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

impl<'de> Deserialize<'de> for MetricValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(MetricValue::score(v)),
            Raw::Text(t) if t == NOT_APPLICABLE => Ok(MetricValue::NotApplicable),
            Raw::Text(t) => Err(de::Error::custom(format!(
                "expected a score or \"{NOT_APPLICABLE}\", got {t:?}"
            ))),
        }
    }
}

/// Per-item mapping of metric name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSet(BTreeMap<Metric, MetricValue>);

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a numeric score (clamped into [0, 1]).
    pub fn set_score(&mut self, metric: Metric, value: f64) {
        self.0.insert(metric, MetricValue::score(value));
    }

    pub fn set_not_applicable(&mut self, metric: Metric) {
        self.0.insert(metric, MetricValue::NotApplicable);
    }

    pub fn get(&self, metric: Metric) -> Option<MetricValue> {
        self.0.get(&metric).copied()
    }

    /// Numeric value of a metric, `None` when absent or not applicable.
    pub fn score(&self, metric: Metric) -> Option<f64> {
        self.get(metric).and_then(|v| v.as_score())
    }

    pub fn contains(&self, metric: Metric) -> bool {
        self.0.contains_key(&metric)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, MetricValue)> + '_ {
        self.0.iter().map(|(m, v)| (*m, *v))
    }
}

impl FromIterator<(Metric, MetricValue)> for MetricSet {
    fn from_iter<I: IntoIterator<Item = (Metric, MetricValue)>>(iter: I) -> Self {
        MetricSet(iter.into_iter().collect())
    }
}

/// Why a scorer fell back to a sentinel or a cheaper estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// Nothing to measure (empty grid, no sentences).
    EmptyInput,
    /// The raster produced a non-finite statistic.
    DegenerateImage,
    /// No embedding backend could be loaded.
    EmbeddingUnavailable,
    /// The backend loaded but failed to encode this batch.
    EmbeddingFailed,
    /// No spell-check backend for a script; the built-in table was used.
    SpellCheckUnavailable,
    /// Even the lexical fallback had nothing to compare.
    LexicalFallbackFailed,
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DegradedReason::EmptyInput => "empty input",
            DegradedReason::DegenerateImage => "degenerate image statistics",
            DegradedReason::EmbeddingUnavailable => "embedding backend unavailable",
            DegradedReason::EmbeddingFailed => "embedding backend failed",
            DegradedReason::SpellCheckUnavailable => "spell-check backend unavailable",
            DegradedReason::LexicalFallbackFailed => "lexical fallback failed",
        };
        f.write_str(text)
    }
}

/// Outcome of a leaf scorer. `Degraded` carries the value the scorer fell back
/// to, so "measured 0.5" and "defaulted to 0.5" stay distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Measured {
    Exact { value: f64 },
    Degraded { fallback: f64, reason: DegradedReason },
}

impl Measured {
    pub fn exact(value: f64) -> Self {
        Measured::Exact {
            value: clamp_unit(value),
        }
    }

    pub fn degraded(fallback: f64, reason: DegradedReason) -> Self {
        Measured::Degraded {
            fallback: clamp_unit(fallback),
            reason,
        }
    }

    /// The score to use, whether measured or defaulted.
    pub fn value(&self) -> f64 {
        match self {
            Measured::Exact { value } => *value,
            Measured::Degraded { fallback, .. } => *fallback,
        }
    }

    pub fn degraded_reason(&self) -> Option<DegradedReason> {
        match self {
            Measured::Exact { .. } => None,
            Measured::Degraded { reason, .. } => Some(*reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded_reason().is_some()
    }
}

/// Clamp into [0, 1]; NaN maps to 0.0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Unweighted mean of the numeric entries; "N/A" entries count in neither the
/// numerator nor the denominator. Empty sets score 0.0.
pub fn calc_total_score(metrics: &MetricSet) -> f64 {
    let scores: Vec<f64> = metrics.iter().filter_map(|(_, v)| v.as_score()).collect();

    if scores.is_empty() {
        return 0.0;
    }

    scores.iter().sum::<f64>() / scores.len() as f64
}
