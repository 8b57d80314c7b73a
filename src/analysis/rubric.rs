//! Potency rubric.
//!
//! A fixed table of half-open nanomolar intervals. The table is exhaustive for
//! `[0, +inf)`; anything else (negative or NaN) is `Unknown`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative potency label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PotencyBucket {
    VeryHigh,
    High,
    Strong,
    Moderate,
    Weak,
    VeryWeakOrNone,
    Unknown,
}

impl PotencyBucket {
    /// Rubric label as printed in report bullets.
    pub fn label(&self) -> &'static str {
        match self {
            PotencyBucket::VeryHigh => "Very high",
            PotencyBucket::High => "High",
            PotencyBucket::Strong => "Strong",
            PotencyBucket::Moderate => "Moderate",
            PotencyBucket::Weak => "Weak",
            PotencyBucket::VeryWeakOrNone => "Very weak/None",
            PotencyBucket::Unknown => "Unknown",
        }
    }

    /// Lower-cased label used inside sentences.
    pub fn sentence_label(&self) -> String {
        self.label().to_lowercase()
    }
}

impl fmt::Display for PotencyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One `[lo, hi)` band of the rubric.
#[derive(Debug, Clone, Copy)]
pub struct RubricBand {
    pub bucket: PotencyBucket,
    pub lo: f64,
    pub hi: f64,
}

impl RubricBand {
    const fn new(bucket: PotencyBucket, lo: f64, hi: f64) -> Self {
        Self { bucket, lo, hi }
    }

    fn contains(&self, nm: f64) -> bool {
        self.lo <= nm && nm < self.hi
    }
}

/// The potency rubric in nM, evaluated top to bottom.
pub const POTENCY_RUBRIC: [RubricBand; 6] = [
    RubricBand::new(PotencyBucket::VeryHigh, 0.0, 1.0),
    RubricBand::new(PotencyBucket::High, 1.0, 10.0),
    RubricBand::new(PotencyBucket::Strong, 10.0, 100.0),
    RubricBand::new(PotencyBucket::Moderate, 100.0, 1_000.0),
    RubricBand::new(PotencyBucket::Weak, 1_000.0, 10_000.0),
    RubricBand::new(PotencyBucket::VeryWeakOrNone, 10_000.0, f64::INFINITY),
];

/// Classify a nanomolar value against [`POTENCY_RUBRIC`].
pub fn classify(nm: f64) -> PotencyBucket {
    POTENCY_RUBRIC
        .iter()
        .find(|band| band.contains(nm))
        .map(|band| band.bucket)
        .unwrap_or(PotencyBucket::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(classify(0.0), PotencyBucket::VeryHigh);
        assert_eq!(classify(0.5), PotencyBucket::VeryHigh);
        assert_eq!(classify(1.0), PotencyBucket::High);
        assert_eq!(classify(10.0), PotencyBucket::Strong);
        assert_eq!(classify(100.0), PotencyBucket::Moderate);
        assert_eq!(classify(1_000.0), PotencyBucket::Weak);
        assert_eq!(classify(9_999.999), PotencyBucket::Weak);
        assert_eq!(classify(10_000.0), PotencyBucket::VeryWeakOrNone);
    }

    #[test]
    fn test_out_of_range_is_unknown() {
        assert_eq!(classify(-1.0), PotencyBucket::Unknown);
        assert_eq!(classify(f64::NAN), PotencyBucket::Unknown);
        assert_eq!(classify(f64::INFINITY), PotencyBucket::Unknown);
    }

    #[test]
    fn test_labels() {
        assert_eq!(PotencyBucket::VeryWeakOrNone.to_string(), "Very weak/None");
        assert_eq!(PotencyBucket::VeryWeakOrNone.sentence_label(), "very weak/none");
        assert_eq!(PotencyBucket::VeryHigh.sentence_label(), "very high");
    }

    #[test]
    fn test_rubric_is_contiguous() {
        for pair in POTENCY_RUBRIC.windows(2) {
            assert_eq!(pair[0].hi, pair[1].lo);
        }
        assert_eq!(POTENCY_RUBRIC[0].lo, 0.0);
        assert!(POTENCY_RUBRIC[5].hi.is_infinite());
    }

    proptest! {
        #[test]
        fn finite_non_negative_values_are_never_unknown(nm in 0.0f64..1.0e15) {
            prop_assert_ne!(classify(nm), PotencyBucket::Unknown);
        }
    }
}
