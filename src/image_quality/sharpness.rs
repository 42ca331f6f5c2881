//! Laplacian-variance sharpness.
//!
//! Sharp images have strong high-frequency content, so the response of a
//! second-derivative filter varies a lot across the frame. Blurred images give
//! a flat response and a small variance.

use super::raster::{mean_and_std, IntensityGrid};
use crate::scoring::{DegradedReason, Measured};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Neutral score used when the variance cannot be measured.
pub const SHARPNESS_FALLBACK: f64 = 0.5;

/// Variance of the 4-neighbour Laplacian `[0 1 0; 1 -4 1; 0 1 0]`, evaluated
/// at every pixel with reflect-101 borders. `None` for an empty grid.
pub fn laplacian_variance(grid: &IntensityGrid) -> Option<f64> {
    if grid.is_empty() {
        return None;
    }

    let (w, h) = (grid.width() as isize, grid.height() as isize);
    let mut responses = Vec::with_capacity(grid.values().len());

    for y in 0..h {
        for x in 0..w {
            let center = grid.reflected(x, y);
            let response = grid.reflected(x, y - 1)
                + grid.reflected(x, y + 1)
                + grid.reflected(x - 1, y)
                + grid.reflected(x + 1, y)
                - 4.0 * center;
            responses.push(response);
        }
    }

    let (_, std) = mean_and_std(&responses)?;
    let variance = std * std;
    variance.is_finite().then_some(variance)
}

/// Piecewise-linear map of Laplacian variance into [0, 1].
///
/// | variance    | score        |
/// |-------------|--------------|
/// | `< 100`     | 0.2 .. 0.5   |
/// | `100..500`  | 0.4 .. 0.7   |
/// | `500..1000` | 0.7 .. 1.0   |
/// | `>= 1000`   | 1.0          |
pub fn sharpness_curve(variance: f64) -> f64 {
    let score = if variance >= 1000.0 {
        1.0
    } else if variance >= 500.0 {
        0.7 + (variance - 500.0) / 500.0 * 0.3
    } else if variance >= 100.0 {
        0.4 + (variance - 100.0) / 400.0 * 0.3
    } else {
        0.2 + (variance / 100.0) * 0.3
    };
    score.clamp(0.0, 1.0)
}

/// Sharpness of an intensity grid; degenerate input falls back to 0.5.
pub fn sharpness_score(grid: &IntensityGrid) -> Measured {
    match laplacian_variance(grid) {
        Some(variance) => Measured::exact(sharpness_curve(variance)),
        None => {
            let reason = if grid.is_empty() {
                DegradedReason::EmptyInput
            } else {
                DegradedReason::DegenerateImage
            };
            log_warn!("sharpness not measurable ({reason}), using {SHARPNESS_FALLBACK}");
            Measured::degraded(SHARPNESS_FALLBACK, reason)
        }
    }
}
