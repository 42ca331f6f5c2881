//! Batch analysis over a homogeneous collection of samples.
//!
//! Large collections are subsampled first. Every retained item is analyzed
//! on its own; set-level properties (image duplication) are computed once over
//! all retained items afterwards. Each item gets an RNG seeded from the batch
//! RNG, so the sequential and rayon paths produce identical reports.

pub mod config;
pub mod report;
pub mod sampling;

pub use config::BatchConfig;
pub use report::{DatasetReport, ItemReport, ResolutionDistribution, SampleKind, ScoreSummary};

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::{QualityError, Result};
use crate::image_quality::{phash, ImageAnalyzer, ImageQuality, RasterImage};
use crate::scoring::{calc_total_score, DegradedReason, Grade, Metric, MetricSet};
use crate::text_quality::{TextAnalyzer, TextQuality};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// One input item.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Image(RasterImage),
    Text(String),
}

impl Sample {
    pub fn kind(&self) -> SampleKind {
        match self {
            Sample::Image(_) => SampleKind::Image,
            Sample::Text(_) => SampleKind::Text,
        }
    }
}

impl From<RasterImage> for Sample {
    fn from(img: RasterImage) -> Self {
        Sample::Image(img)
    }
}

impl From<String> for Sample {
    fn from(text: String) -> Self {
        Sample::Text(text)
    }
}

impl From<&str> for Sample {
    fn from(text: &str) -> Self {
        Sample::Text(text.to_string())
    }
}

/// `(resolution + validity + (1 - duplication)) / 3`, the per-item image
/// total once a shared set-level duplication score exists.
pub fn folded_image_total(resolution: f64, validity: f64, duplication: f64) -> f64 {
    (resolution + validity + (1.0 - duplication)) / 3.0
}

#[derive(Debug, Clone, Default)]
pub struct BatchAnalyzer {
    config: BatchConfig,
    images: ImageAnalyzer,
    texts: TextAnalyzer,
}

impl BatchAnalyzer {
    pub fn new(config: BatchConfig, texts: TextAnalyzer) -> Self {
        Self {
            config,
            images: ImageAnalyzer::new(),
            texts,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Analyze with the configured sample limit. Randomness comes from the
    /// configured seed, or OS entropy when none is set.
    pub fn analyze(&self, samples: &[Sample]) -> Result<DatasetReport> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.analyze_with_rng(samples, self.config.max_samples, &mut rng)
    }

    /// Empty input yields an all-zero report. Mixing images and texts, or a
    /// zero sample limit, is an error.
    pub fn analyze_with_rng<R: Rng + ?Sized>(
        &self,
        samples: &[Sample],
        max_samples: usize,
        rng: &mut R,
    ) -> Result<DatasetReport> {
        let Some(first) = samples.first() else {
            return Ok(DatasetReport::empty(None));
        };

        if max_samples == 0 {
            return Err(QualityError::InvalidInput(
                "max_samples must be at least 1".into(),
            ));
        }

        let kind = first.kind();
        if let Some((index, other)) = samples
            .iter()
            .enumerate()
            .find(|(_, sample)| sample.kind() != kind)
        {
            return Err(QualityError::TypeMismatch {
                expected: kind.as_str(),
                found: other.kind().as_str(),
                index,
            });
        }

        let indices = sampling::sample_indices(samples.len(), max_samples, rng);
        if indices.len() < samples.len() {
            log_info!(
                "sampled {} of {} {kind} items",
                indices.len(),
                samples.len()
            );
        }

        let seeded: Vec<(usize, u64)> = indices.iter().map(|i| (*i, rng.gen())).collect();

        let mut report = match kind {
            SampleKind::Image => self.image_report(samples, &seeded)?,
            SampleKind::Text => self.text_report(samples, &seeded),
        };

        report.original_count = samples.len();
        report.sampled_count = indices.len();
        report.was_sampled = indices.len() < samples.len();
        Ok(report)
    }

    fn map_items<T, F>(&self, seeded: &[(usize, u64)], analyze: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize, u64) -> T + Sync + Send,
    {
        if self.config.parallel {
            seeded.par_iter().map(|(i, seed)| analyze(*i, *seed)).collect()
        } else {
            seeded.iter().map(|(i, seed)| analyze(*i, *seed)).collect()
        }
    }

    fn image_report(&self, samples: &[Sample], seeded: &[(usize, u64)]) -> Result<DatasetReport> {
        let analyzed: Vec<Result<(usize, ImageQuality)>> = self.map_items(seeded, |i, _| {
            match &samples[i] {
                Sample::Image(img) => self.images.inspect(img, false).map(|q| (i, q)),
                Sample::Text(_) => Err(QualityError::TypeMismatch {
                    expected: SampleKind::Image.as_str(),
                    found: SampleKind::Text.as_str(),
                    index: i,
                }),
            }
        });
        let analyzed = analyzed.into_iter().collect::<Result<Vec<_>>>()?;

        let hashes: Vec<_> = analyzed.iter().map(|(_, q)| q.fingerprint.clone()).collect();
        let shared = (analyzed.len() >= 2).then(|| phash::duplication_summary(&hashes));

        let mut degradations = BTreeMap::new();
        let mut items = Vec::with_capacity(analyzed.len());

        for (index, quality) in &analyzed {
            count_degradations(&mut degradations, quality.degradations());

            let mut metrics = quality.metrics.clone();
            metrics.set_score(Metric::Sharpness, quality.sharpness.value());
            metrics.set_score(Metric::Noise, quality.noise.value());

            let total = match &shared {
                Some(summary) => {
                    metrics.set_score(Metric::Duplication, summary.score);
                    folded_image_total(
                        metrics.score(Metric::Resolution).unwrap_or(0.0),
                        metrics.score(Metric::Validity).unwrap_or(0.0),
                        summary.score,
                    )
                }
                None => {
                    let total = calc_total_score(&quality.metrics);
                    metrics.set_not_applicable(Metric::Duplication);
                    total
                }
            };

            log_debug!("image #{index}: total {total:.3}");
            items.push(item_report(*index, metrics, total));
        }

        let dims: Vec<_> = analyzed.iter().map(|(_, q)| q.dimensions).collect();
        let mut report = summarize(SampleKind::Image, items, degradations);
        report.resolution = ResolutionDistribution::from_dimensions(&dims);
        report.duplicate_pairs = shared
            .map(|summary| {
                summary
                    .pairs
                    .into_iter()
                    .map(|mut pair| {
                        pair.first = analyzed[pair.first].0;
                        pair.second = analyzed[pair.second].0;
                        pair
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(report)
    }

    fn text_report(&self, samples: &[Sample], seeded: &[(usize, u64)]) -> DatasetReport {
        let analyzed: Vec<(usize, Option<TextQuality>)> = self.map_items(seeded, |i, seed| {
            let quality = match &samples[i] {
                Sample::Text(text) if !text.trim().is_empty() => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    Some(self.texts.inspect_with_rng(text, &mut rng))
                }
                _ => None,
            };
            (i, quality)
        });

        let mut degradations = BTreeMap::new();
        let mut items = Vec::with_capacity(analyzed.len());
        let mut skipped = 0;

        for (index, quality) in analyzed {
            let Some(quality) = quality else {
                skipped += 1;
                continue;
            };

            count_degradations(&mut degradations, quality.degradations.iter().copied());
            let total = calc_total_score(&quality.metrics);
            log_debug!("text #{index}: total {total:.3}");
            items.push(item_report(index, quality.metrics, total));
        }

        if skipped > 0 {
            log_info!("skipped {skipped} blank texts");
        }

        let mut report = summarize(SampleKind::Text, items, degradations);
        report.skipped_count = skipped;
        report
    }
}

fn item_report(index: usize, metrics: MetricSet, total: f64) -> ItemReport {
    ItemReport {
        index,
        metrics,
        total,
        grade: Grade::from_score(total),
    }
}

fn count_degradations<I>(counts: &mut BTreeMap<DegradedReason, usize>, reasons: I)
where
    I: IntoIterator<Item = DegradedReason>,
{
    for reason in reasons {
        *counts.entry(reason).or_insert(0) += 1;
    }
}

fn summarize(
    kind: SampleKind,
    items: Vec<ItemReport>,
    degradations: BTreeMap<DegradedReason, usize>,
) -> DatasetReport {
    let totals: Vec<f64> = items.iter().map(|item| item.total).collect();
    let total = ScoreSummary::from_scores(&totals);

    let mut report = DatasetReport::empty(Some(kind));
    report.item_count = items.len();
    if !items.is_empty() {
        report.metric_means = report::metric_means(items.iter().map(|item| &item.metrics));
    }
    report.total = total;
    report.grade = Grade::from_score(total.mean);
    report.items = items;
    report.degradations = degradations;
    report
}

/// Analyze a batch with default analyzers and OS-entropy sampling.
pub fn analyze_batch(samples: &[Sample], max_samples: usize) -> Result<DatasetReport> {
    BatchAnalyzer::default().analyze_with_rng(samples, max_samples, &mut StdRng::from_entropy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::MetricValue;

    fn checkerboard(size: u32, cell: u32) -> RasterImage {
        let pixels = (0..size)
            .flat_map(|y| (0..size).map(move |x| if (x / cell + y / cell) % 2 == 0 { 0 } else { 255 }))
            .collect();
        RasterImage::new(pixels, size, size, 1).unwrap()
    }

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    #[test]
    fn test_empty_batch_is_zero_report() {
        let report = BatchAnalyzer::default()
            .analyze_with_rng(&[], 10, &mut seeded())
            .unwrap();
        assert_eq!(report.item_count, 0);
        assert_eq!(report.total.mean, 0.0);
        assert_eq!(report.kind, None);
    }

    #[test]
    fn test_mixed_batch_is_rejected() {
        let samples = vec![
            Sample::from("첫 번째 텍스트입니다"),
            Sample::Image(RasterImage::filled(8, 8, 0).unwrap()),
        ];
        let err = BatchAnalyzer::default()
            .analyze_with_rng(&samples, 10, &mut seeded())
            .unwrap_err();
        assert_eq!(
            err,
            QualityError::TypeMismatch {
                expected: "text",
                found: "image",
                index: 1
            }
        );
    }

    #[test]
    fn test_zero_max_samples_is_rejected() {
        let samples = vec![Sample::from("text")];
        let err = BatchAnalyzer::default()
            .analyze_with_rng(&samples, 0, &mut seeded())
            .unwrap_err();
        assert!(matches!(err, QualityError::InvalidInput(_)));
    }

    #[test]
    fn test_identical_images_share_zero_duplication() {
        let img = checkerboard(64, 4);
        let samples = vec![Sample::Image(img.clone()), Sample::Image(img)];

        let report = BatchAnalyzer::default()
            .analyze_with_rng(&samples, 10, &mut seeded())
            .unwrap();

        assert_eq!(report.mean(Metric::Duplication), Some(0.0));
        assert_eq!(report.duplicate_pairs.len(), 1);
        for item in &report.items {
            assert_eq!(item.metrics.score(Metric::Duplication), Some(0.0));
            let expected = folded_image_total(
                item.metrics.score(Metric::Resolution).unwrap(),
                item.metrics.score(Metric::Validity).unwrap(),
                0.0,
            );
            assert!((item.total - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_single_image_batch_has_na_duplication() {
        let samples = vec![Sample::Image(RasterImage::filled(64, 64, 128).unwrap())];
        let report = BatchAnalyzer::default()
            .analyze_with_rng(&samples, 10, &mut seeded())
            .unwrap();

        let item = &report.items[0];
        assert_eq!(item.metrics.get(Metric::Duplication), Some(MetricValue::NotApplicable));
        assert!(report.mean(Metric::Duplication).is_none());
        assert!(report.duplicate_pairs.is_empty());

        // mean of resolution 0.125 and validity 0.2
        assert!((item.total - 0.1625).abs() < 1e-9);
        assert_eq!(report.total.std, 0.0);
        assert_eq!(report.resolution.as_ref().unwrap().min.to_string(), "64x64");
    }

    #[test]
    fn test_subsampling_records_counts() {
        let samples: Vec<Sample> = (0..12)
            .map(|i| Sample::Text(format!("샘플 문장 번호 {i}번입니다. 내용이 조금씩 다릅니다.")))
            .collect();

        let report = BatchAnalyzer::default()
            .analyze_with_rng(&samples, 5, &mut seeded())
            .unwrap();

        assert_eq!(report.sampled_count, 5);
        assert_eq!(report.original_count, 12);
        assert!(report.was_sampled);
        assert_eq!(report.items.len(), 5);
        assert!(report.items.windows(2).all(|w| w[0].index < w[1].index));
    }

    #[test]
    fn test_blank_texts_are_skipped() {
        let samples = vec![
            Sample::from("정상적인 문장이 여기에 있습니다."),
            Sample::from("   "),
            Sample::from(""),
        ];
        let report = BatchAnalyzer::default()
            .analyze_with_rng(&samples, 10, &mut seeded())
            .unwrap();

        assert_eq!(report.skipped_count, 2);
        assert_eq!(report.item_count, 1);
        assert_eq!(report.items[0].index, 0);
    }

    #[test]
    fn test_all_blank_texts_give_zero_means() {
        let samples = vec![Sample::from("   "), Sample::from("")];
        let report = BatchAnalyzer::default()
            .analyze_with_rng(&samples, 10, &mut seeded())
            .unwrap();

        assert_eq!(report.kind, Some(SampleKind::Text));
        assert_eq!(report.item_count, 0);
        assert_eq!(report.skipped_count, 2);
        assert_eq!(report.mean(Metric::Accuracy), Some(0.0));
        assert_eq!(report.mean(Metric::Duplication), Some(0.0));
        assert_eq!(report.mean(Metric::Completeness), Some(0.0));
        assert_eq!(report.total.mean, 0.0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let samples: Vec<Sample> = (0..8)
            .map(|i| Sample::Text(format!("문서 {i}의 첫 문장입니다. 문서 {i}의 두 번째 문장입니다.")))
            .collect();

        let sequential = BatchAnalyzer::default()
            .analyze_with_rng(&samples, 5, &mut seeded())
            .unwrap();
        let parallel = BatchAnalyzer::new(
            BatchConfig {
                parallel: true,
                ..BatchConfig::default()
            },
            TextAnalyzer::default(),
        )
        .analyze_with_rng(&samples, 5, &mut seeded())
        .unwrap();

        assert_eq!(sequential.items, parallel.items);
        assert_eq!(sequential.total, parallel.total);
    }
}
