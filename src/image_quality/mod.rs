//! Single-image quality analysis: resolution, optical validity (sharpness
//! fused with noise) and the average-hash fingerprint used for set-level
//! duplication.

pub mod noise;
pub mod phash;
pub mod raster;
pub mod resolution;
pub mod sharpness;

pub use phash::{duplication_score, duplication_summary, DuplicationSummary, ImageFingerprint};
pub use raster::{Dimensions, IntensityGrid, RasterImage};

use serde::Serialize;

use crate::error::Result;
use crate::scoring::{DegradedReason, Measured, Metric, MetricSet};

/// Everything measured on one image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageQuality {
    pub metrics: MetricSet,
    pub dimensions: Dimensions,
    pub sharpness: Measured,
    pub noise: Measured,
    pub laplacian_variance: Option<f64>,
    pub fingerprint: ImageFingerprint,
}

impl ImageQuality {
    pub fn degradations(&self) -> Vec<DegradedReason> {
        [self.sharpness, self.noise]
            .iter()
            .filter_map(|m| m.degraded_reason())
            .collect()
    }
}

/// `(sharpness + (1 - noise)) / 2`, both optical-quality signals on one axis.
pub fn validity_score(sharpness: f64, noise: f64) -> f64 {
    (sharpness + (1.0 - noise)) / 2.0
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageAnalyzer;

impl ImageAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Score one image. `resolution` and `validity` are always present. In
    /// single-item mode `duplication` is recorded as not applicable; otherwise
    /// it is left out for the batch aggregator to fill in.
    pub fn analyze(&self, img: &RasterImage, single_item_mode: bool) -> Result<MetricSet> {
        Ok(self.inspect(img, single_item_mode)?.metrics)
    }

    /// Like [`ImageAnalyzer::analyze`] but keeps the intermediate measurements.
    pub fn inspect(&self, img: &RasterImage, single_item_mode: bool) -> Result<ImageQuality> {
        let resolution = resolution::resolution_score(img.height(), img.width())?;

        let gray = img.to_intensity();
        let laplacian_variance = sharpness::laplacian_variance(&gray);
        let sharpness = sharpness::sharpness_score(&gray);
        let noise = noise::noise_score(&gray);
        let fingerprint = phash::compute_average_hash(img)?;

        let mut metrics = MetricSet::new();
        metrics.set_score(Metric::Resolution, resolution);
        metrics.set_score(Metric::Validity, validity_score(sharpness.value(), noise.value()));
        if single_item_mode {
            metrics.set_not_applicable(Metric::Duplication);
        }

        Ok(ImageQuality {
            metrics,
            dimensions: img.dimensions(),
            sharpness,
            noise,
            laplacian_variance,
            fingerprint,
        })
    }
}

/// Score one image with the default analyzer.
pub fn analyze_image(img: &RasterImage, single_item_mode: bool) -> Result<MetricSet> {
    ImageAnalyzer::new().analyze(img, single_item_mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{calc_total_score, MetricValue};

    #[test]
    fn test_flat_gray_image() {
        let img = RasterImage::filled(64, 64, 128).unwrap();
        let quality = ImageAnalyzer::new().inspect(&img, true).unwrap();

        assert!((quality.metrics.score(Metric::Resolution).unwrap() - 0.125).abs() < 1e-12);
        assert_eq!(quality.laplacian_variance, Some(0.0));
        assert_eq!(quality.sharpness, Measured::exact(0.2));
        assert!((quality.noise.value() - 0.8).abs() < 1e-12);

        let validity = quality.metrics.score(Metric::Validity).unwrap();
        assert!((validity - 0.2).abs() < 1e-9);
        assert!(quality.degradations().is_empty());
    }

    #[test]
    fn test_single_item_mode_marks_duplication_na() {
        let img = RasterImage::filled(32, 32, 10).unwrap();

        let single = analyze_image(&img, true).unwrap();
        assert_eq!(single.get(Metric::Duplication), Some(MetricValue::NotApplicable));
        assert_eq!(single.len(), 3);

        let batch = analyze_image(&img, false).unwrap();
        assert!(!batch.contains(Metric::Duplication));
        assert_eq!(batch.len(), 2);

        // N/A is ignored by the combiner
        assert_eq!(calc_total_score(&single), calc_total_score(&batch));
    }

    #[test]
    fn test_metrics_in_unit_range_for_color_image() {
        let pixels: Vec<u8> = (0..48 * 40 * 4).map(|i| (i * 37 % 256) as u8).collect();
        let img = RasterImage::new(pixels, 48, 40, 4).unwrap();
        let metrics = analyze_image(&img, true).unwrap();

        for (_, value) in metrics.iter() {
            if let Some(v) = value.as_score() {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_validity_formula() {
        assert!((validity_score(1.0, 0.0) - 1.0).abs() < 1e-12);
        assert!((validity_score(0.4, 0.6) - 0.4).abs() < 1e-12);
    }
}
