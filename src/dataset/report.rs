use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::image_quality::phash::DuplicatePair;
use crate::image_quality::Dimensions;
use crate::scoring::{DegradedReason, Grade, Metric, MetricSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    Image,
    Text,
}

impl SampleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleKind::Image => "image",
            SampleKind::Text => "text",
        }
    }

    /// Metrics reported as 0.0 when a batch of this kind has nothing to score.
    pub fn headline_metrics(&self) -> &'static [Metric] {
        match self {
            SampleKind::Image => &[Metric::Resolution, Metric::Sharpness, Metric::Noise],
            SampleKind::Text => &[Metric::Accuracy, Metric::Duplication, Metric::Completeness],
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mean, extremes and population standard deviation of item totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

impl ScoreSummary {
    /// All zeros for an empty slice; `std` is 0.0 for a single score.
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }

        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let std = if scores.len() > 1 {
            (scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n).sqrt()
        } else {
            0.0
        };

        Self { mean, min, max, std }
    }
}

/// Pixel dimensions of the analyzed images. Width and height statistics are
/// taken independently and truncated to whole pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionDistribution {
    pub min: Dimensions,
    pub max: Dimensions,
    pub mean: Dimensions,
    pub median: Dimensions,
    pub average_pixel_count: u64,
    pub resolutions: Vec<Dimensions>,
}

impl ResolutionDistribution {
    pub fn from_dimensions(dims: &[Dimensions]) -> Option<Self> {
        if dims.is_empty() {
            return None;
        }

        let mut widths: Vec<u32> = dims.iter().map(|d| d.width).collect();
        let mut heights: Vec<u32> = dims.iter().map(|d| d.height).collect();
        widths.sort_unstable();
        heights.sort_unstable();

        let n = dims.len() as u64;
        let mean_of = |values: &[u32]| (values.iter().map(|v| *v as u64).sum::<u64>() / n) as u32;

        Some(Self {
            min: Dimensions {
                width: widths[0],
                height: heights[0],
            },
            max: Dimensions {
                width: widths[widths.len() - 1],
                height: heights[heights.len() - 1],
            },
            mean: Dimensions {
                width: mean_of(&widths),
                height: mean_of(&heights),
            },
            median: Dimensions {
                width: median_of_sorted(&widths),
                height: median_of_sorted(&heights),
            },
            average_pixel_count: dims.iter().map(|d| d.pixel_count()).sum::<u64>() / n,
            resolutions: dims.to_vec(),
        })
    }
}

fn median_of_sorted(values: &[u32]) -> u32 {
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        ((values[mid - 1] as u64 + values[mid] as u64) / 2) as u32
    } else {
        values[mid]
    }
}

/// One analyzed item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    /// Position in the caller's collection, before subsampling
    pub index: usize,
    pub metrics: MetricSet,
    pub total: f64,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetReport {
    /// `None` only for an empty batch
    pub kind: Option<SampleKind>,
    /// Items that were scored
    pub item_count: usize,
    pub original_count: usize,
    pub sampled_count: usize,
    pub was_sampled: bool,
    /// Blank texts among the sampled items, excluded from scoring
    pub skipped_count: usize,
    pub metric_means: BTreeMap<Metric, f64>,
    pub total: ScoreSummary,
    pub grade: Grade,
    pub resolution: Option<ResolutionDistribution>,
    pub duplicate_pairs: Vec<DuplicatePair>,
    pub items: Vec<ItemReport>,
    /// How many measurements fell back, per reason
    pub degradations: BTreeMap<DegradedReason, usize>,
    pub generated_at: DateTime<Utc>,
}

impl DatasetReport {
    /// All-zero report for a batch with nothing to score.
    pub fn empty(kind: Option<SampleKind>) -> Self {
        Self {
            kind,
            item_count: 0,
            original_count: 0,
            sampled_count: 0,
            was_sampled: false,
            skipped_count: 0,
            metric_means: kind
                .map(|kind| kind.headline_metrics().iter().map(|m| (*m, 0.0)).collect())
                .unwrap_or_default(),
            total: ScoreSummary::default(),
            grade: Grade::from_score(0.0),
            resolution: None,
            duplicate_pairs: Vec::new(),
            items: Vec::new(),
            degradations: BTreeMap::new(),
            generated_at: Utc::now(),
        }
    }

    pub fn mean(&self, metric: Metric) -> Option<f64> {
        self.metric_means.get(&metric).copied()
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// Mean of each metric over the items that report a numeric value for it.
pub(crate) fn metric_means<'a, I>(items: I) -> BTreeMap<Metric, f64>
where
    I: IntoIterator<Item = &'a MetricSet>,
{
    let mut sums: BTreeMap<Metric, (f64, usize)> = BTreeMap::new();
    for metrics in items {
        for (metric, value) in metrics.iter() {
            if let Some(score) = value.as_score() {
                let entry = sums.entry(metric).or_insert((0.0, 0));
                entry.0 += score;
                entry.1 += 1;
            }
        }
    }

    sums.into_iter()
        .map(|(metric, (sum, count))| (metric, sum / count as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn test_score_summary() {
        let summary = ScoreSummary::from_scores(&[0.2, 0.4, 0.6]);
        assert!((summary.mean - 0.4).abs() < 1e-12);
        assert_eq!(summary.min, 0.2);
        assert_eq!(summary.max, 0.6);
        // population std
        assert!((summary.std - (0.08f64 / 3.0).sqrt()).abs() < 1e-12);

        assert_eq!(ScoreSummary::from_scores(&[0.7]).std, 0.0);
        assert_eq!(ScoreSummary::from_scores(&[]), ScoreSummary::default());
    }

    #[test]
    fn test_resolution_distribution() {
        let dist = ResolutionDistribution::from_dimensions(&[
            dims(640, 480),
            dims(1920, 1080),
            dims(800, 1200),
            dims(101, 99),
        ])
        .unwrap();

        assert_eq!(dist.min, dims(101, 99));
        assert_eq!(dist.max, dims(1920, 1200));
        // (640 + 1920 + 800 + 101) / 4 = 865.25
        assert_eq!(dist.mean, dims(865, 714));
        // sorted widths 101 640 800 1920, heights 99 480 1080 1200
        assert_eq!(dist.median, dims(720, 780));
        assert_eq!(dist.resolutions.len(), 4);
        assert_eq!(
            dist.average_pixel_count,
            (640 * 480 + 1920 * 1080 + 800 * 1200 + 101 * 99) / 4
        );
    }

    #[test]
    fn test_empty_distribution() {
        assert!(ResolutionDistribution::from_dimensions(&[]).is_none());
    }

    #[test]
    fn test_metric_means_skip_not_applicable() {
        let mut a = MetricSet::new();
        a.set_score(Metric::Resolution, 0.2);
        a.set_not_applicable(Metric::Duplication);
        let mut b = MetricSet::new();
        b.set_score(Metric::Resolution, 0.4);
        b.set_score(Metric::Duplication, 0.9);

        let means = metric_means([&a, &b]);
        assert!((means[&Metric::Resolution] - 0.3).abs() < 1e-12);
        assert!((means[&Metric::Duplication] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_empty_report_is_all_zero() {
        let report = DatasetReport::empty(None);
        assert_eq!(report.item_count, 0);
        assert_eq!(report.total, ScoreSummary::default());
        assert_eq!(report.grade, Grade::D);
        assert!(report.items.is_empty());
        assert!(report.metric_means.is_empty());
    }

    #[test]
    fn test_empty_report_of_known_kind_has_zero_means() {
        let report = DatasetReport::empty(Some(SampleKind::Text));
        assert_eq!(report.mean(Metric::Accuracy), Some(0.0));
        assert_eq!(report.mean(Metric::Duplication), Some(0.0));
        assert_eq!(report.mean(Metric::Completeness), Some(0.0));

        let report = DatasetReport::empty(Some(SampleKind::Image));
        assert_eq!(report.mean(Metric::Sharpness), Some(0.0));
        assert_eq!(report.metric_means.len(), 3);
    }
}
