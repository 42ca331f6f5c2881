use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter bucket of a total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    /// Step function with breakpoints at 0.8, 0.6 and 0.4 (inclusive lower bounds).
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Grade::A
        } else if score >= 0.6 {
            Grade::B
        } else if score >= 0.4 {
            Grade::C
        } else {
            Grade::D
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }

    /// Readiness verdict shown next to the grade in reports.
    pub fn description(&self) -> &'static str {
        match self {
            Grade::A => "Excellent quality. Ready to use for AI training as is.",
            Grade::B => "Good quality. Some improvement may be needed.",
            Grade::C => "Fair quality. Cleanup is recommended.",
            Grade::D => "Poor quality. Data cleaning is required before use.",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn get_grade(score: f64) -> Grade {
    Grade::from_score(score)
}

/// Fixed-precision rendering used by reports.
pub fn format_score(score: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(get_grade(0.8), Grade::A);
        assert_eq!(get_grade(0.79999), Grade::B);
        assert_eq!(get_grade(0.6), Grade::B);
        assert_eq!(get_grade(0.4), Grade::C);
        assert_eq!(get_grade(0.39999), Grade::D);
    }

    #[test]
    fn test_grade_extremes() {
        assert_eq!(get_grade(1.0), Grade::A);
        assert_eq!(get_grade(0.0), Grade::D);
        assert_eq!(get_grade(0.8).to_string(), "A");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.12345, 3), "0.123");
        assert_eq!(format_score(1.0, 1), "1.0");
    }
}
