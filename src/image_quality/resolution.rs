use crate::error::{QualityError, Result};

/// Shorter side at which an image earns full resolution credit.
const MIN_STANDARD_SIDE: f64 = 512.0;
/// Aspect ratios above this are penalized.
const MAX_ASPECT_RATIO: f64 = 4.0;
const ASPECT_PENALTY: f64 = 0.9;
/// Longer side at which a high-resolution bonus applies.
const HIGH_RES_SIDE: u32 = 2048;
const HIGH_RES_BONUS: f64 = 1.1;

/// Score image dimensions into [0, 1].
pub fn resolution_score(height: u32, width: u32) -> Result<f64> {
    if height == 0 || width == 0 {
        return Err(QualityError::InvalidInput(format!(
            "resolution needs positive dimensions, got {width}x{height}"
        )));
    }

    let min_dim = height.min(width);
    let max_dim = height.max(width);

    let mut score = (min_dim as f64 / MIN_STANDARD_SIDE).min(1.0);

    let aspect_ratio = max_dim as f64 / min_dim as f64;
    if aspect_ratio > MAX_ASPECT_RATIO {
        score *= ASPECT_PENALTY;
    }

    if max_dim >= HIGH_RES_SIDE {
        score = (score * HIGH_RES_BONUS).min(1.0);
    }

    Ok(score.max(0.0))
}
