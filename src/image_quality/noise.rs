//! Blur-difference noise estimate.
//!
//! A light Gaussian smoothing removes pixel-level noise; what the smoothing
//! takes away is the noise estimate. Over-smoothed images are penalized too,
//! since a blurred frame looks "clean" for the wrong reason.

use super::raster::{mean_and_std, IntensityGrid};
use super::sharpness::laplacian_variance;
use crate::scoring::{DegradedReason, Measured};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const NOISE_FALLBACK: f64 = 0.5;

/// Noise level at which the normalized noise saturates.
const NOISE_NORMALIZER: f64 = 20.0;
/// Laplacian variance below which the blur penalty starts.
const BLUR_REFERENCE_VARIANCE: f64 = 500.0;
const NOISE_WEIGHT: f64 = 0.8;
const BLUR_WEIGHT: f64 = 0.2;

/// Separable 3-tap binomial kernel, the 3x3 Gaussian for a size-derived sigma.
const KERNEL: [f64; 3] = [0.25, 0.5, 0.25];

/// Intermediate terms of the noise score, kept for reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseBreakdown {
    pub noise_level: f64,
    pub normalized_noise: f64,
    pub blur_factor: f64,
    pub score: f64,
}

/// 3x3 Gaussian smoothing with reflect-101 borders, rounded to 8-bit levels.
pub fn gaussian_blur_3x3(grid: &IntensityGrid) -> IntensityGrid {
    let (w, h) = (grid.width(), grid.height());
    let mut horizontal = Vec::with_capacity(w * h);
    for y in 0..h as isize {
        for x in 0..w as isize {
            let v = KERNEL[0] * grid.reflected(x - 1, y)
                + KERNEL[1] * grid.reflected(x, y)
                + KERNEL[2] * grid.reflected(x + 1, y);
            horizontal.push(v);
        }
    }

    let Some(pass) = IntensityGrid::from_values(horizontal, w, h) else {
        return grid.clone();
    };

    let mut blurred = Vec::with_capacity(w * h);
    for y in 0..h as isize {
        for x in 0..w as isize {
            let v = KERNEL[0] * pass.reflected(x, y - 1)
                + KERNEL[1] * pass.reflected(x, y)
                + KERNEL[2] * pass.reflected(x, y + 1);
            blurred.push(v.round().clamp(0.0, 255.0));
        }
    }

    IntensityGrid::from_values(blurred, w, h).unwrap_or_else(|| grid.clone())
}

/// Full breakdown, `None` when the grid is empty or produces non-finite stats.
pub fn noise_breakdown(grid: &IntensityGrid) -> Option<NoiseBreakdown> {
    if grid.is_empty() {
        return None;
    }

    let blurred = gaussian_blur_3x3(grid);
    let diff: Vec<f64> = grid
        .values()
        .iter()
        .zip(blurred.values())
        .map(|(a, b)| (a - b).abs())
        .collect();

    let (mean, std) = mean_and_std(&diff)?;
    let noise_level = 0.6 * std + 0.4 * mean;
    let normalized_noise = (noise_level / NOISE_NORMALIZER).clamp(0.0, 1.0);

    let variance = laplacian_variance(grid)?;
    let blur_factor = (1.0 - variance / BLUR_REFERENCE_VARIANCE).clamp(0.0, 1.0);

    let score = (1.0 - NOISE_WEIGHT * normalized_noise - BLUR_WEIGHT * blur_factor).clamp(0.0, 1.0);

    score.is_finite().then_some(NoiseBreakdown {
        noise_level,
        normalized_noise,
        blur_factor,
        score,
    })
}

/// Noise score in [0, 1], higher is better (clean and not over-smoothed).
pub fn noise_score(grid: &IntensityGrid) -> Measured {
    match noise_breakdown(grid) {
        Some(breakdown) => Measured::exact(breakdown.score),
        None => {
            let reason = if grid.is_empty() {
                DegradedReason::EmptyInput
            } else {
                DegradedReason::DegenerateImage
            };
            log_warn!("noise not measurable ({reason}), using {NOISE_FALLBACK}");
            Measured::degraded(NOISE_FALLBACK, reason)
        }
    }
}
