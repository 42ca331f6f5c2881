use image_hasher::{HashAlg, HasherConfig, ImageHash};
use serde::{Serialize, Serializer};

use super::raster::RasterImage;
use crate::error::Result;

/// Hash grid side; 8x8 gives a 64-bit fingerprint.
const HASH_SIDE: u32 = 8;

/// Duplicate credit per Hamming-distance band. Near-duplicates that only
/// differ by recompression or resizing land in the lower bands.
const DUPLICATE_BANDS: [(u32, f64); 5] = [(5, 1.0), (10, 0.95), (15, 0.85), (20, 0.75), (25, 0.6)];

/// Average-hash fingerprint of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFingerprint(ImageHash);

impl ImageFingerprint {
    pub fn distance(&self, other: &ImageFingerprint) -> u32 {
        self.0.dist(&other.0)
    }

    pub fn to_base64(&self) -> String {
        self.0.to_base64()
    }

    pub fn from_base64(encoded: &str) -> Option<Self> {
        ImageHash::from_base64(encoded).ok().map(ImageFingerprint)
    }
}

impl Serialize for ImageFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

/// Downsample to 8x8, threshold every cell against the mean, pack the bits.
pub fn compute_average_hash(img: &RasterImage) -> Result<ImageFingerprint> {
    let dynamic = img.to_dynamic()?;
    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::Mean)
        .hash_size(HASH_SIDE, HASH_SIDE)
        .to_hasher();

    Ok(ImageFingerprint(hasher.hash_image(&dynamic)))
}

/// Weighted duplicate credit for one pair.
pub fn duplicate_credit(distance: u32) -> f64 {
    DUPLICATE_BANDS
        .iter()
        .find(|(max_distance, _)| distance <= *max_distance)
        .map(|(_, credit)| *credit)
        .unwrap_or(0.0)
}

/// A pair of items whose fingerprints earned duplicate credit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DuplicatePair {
    pub first: usize,
    pub second: usize,
    pub distance: u32,
    pub credit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicationSummary {
    /// `1 - duplication_ratio`, 1.0 when nothing can be compared.
    pub score: f64,
    pub duplication_ratio: f64,
    pub comparisons: usize,
    pub pairs: Vec<DuplicatePair>,
}

/// Set-level duplication over all pairs of fingerprints.
pub fn duplication_summary(hashes: &[ImageFingerprint]) -> DuplicationSummary {
    if hashes.len() < 2 {
        return DuplicationSummary {
            score: 1.0,
            duplication_ratio: 0.0,
            comparisons: 0,
            pairs: Vec::new(),
        };
    }

    let mut credit_sum = 0.0;
    let mut comparisons = 0;
    let mut pairs = Vec::new();

    for i in 0..hashes.len() {
        for j in (i + 1)..hashes.len() {
            comparisons += 1;
            let distance = hashes[i].distance(&hashes[j]);
            let credit = duplicate_credit(distance);
            if credit > 0.0 {
                credit_sum += credit;
                pairs.push(DuplicatePair {
                    first: i,
                    second: j,
                    distance,
                    credit,
                });
            }
        }
    }

    let duplication_ratio = credit_sum / comparisons as f64;
    DuplicationSummary {
        score: (1.0 - duplication_ratio).max(0.0),
        duplication_ratio,
        comparisons,
        pairs,
    }
}

pub fn duplication_score(hashes: &[ImageFingerprint]) -> f64 {
    duplication_summary(hashes).score
}
