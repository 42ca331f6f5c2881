//! Error types for the scoring engine

use thiserror::Error;

/// Errors surfaced to callers. Degraded measurements are not errors; see
/// [`crate::scoring::Measured`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QualityError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Batch mixes sample kinds: expected {expected}, found {found} at index {index}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
        index: usize,
    },
}

/// Result type alias for scoring operations
pub type Result<T> = std::result::Result<T, QualityError>;
