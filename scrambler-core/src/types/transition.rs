use std::fmt;

use rand::Rng;

/// Jitter applied to pairs without an explicit table entry (seconds)
pub const FALLBACK_VARIABILITY: f64 = 0.015;

/// Physical relationship between two consecutive keys.
///
/// Each category carries a characteristic inter-key delay in seconds.
/// Common pairs are the fastest, long stretches the slowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionCategory {
    SameFinger,
    AdjacentFinger,
    AlternatingHand,
    CommonPair,
    DiagonalStretch,
    VerticalStretch,
    CrossHand,
    LongStretch,
}

impl TransitionCategory {
    pub const ALL: [TransitionCategory; 8] = [
        TransitionCategory::SameFinger,
        TransitionCategory::AdjacentFinger,
        TransitionCategory::AlternatingHand,
        TransitionCategory::CommonPair,
        TransitionCategory::DiagonalStretch,
        TransitionCategory::VerticalStretch,
        TransitionCategory::CrossHand,
        TransitionCategory::LongStretch,
    ];

    /// Characteristic delay for the category, in seconds
    pub const fn base_delay(self) -> f64 {
        match self {
            TransitionCategory::SameFinger => 0.12,
            TransitionCategory::AdjacentFinger => 0.08,
            TransitionCategory::AlternatingHand => 0.06,
            TransitionCategory::CommonPair => 0.05,
            TransitionCategory::DiagonalStretch => 0.11,
            TransitionCategory::VerticalStretch => 0.10,
            TransitionCategory::CrossHand => 0.13,
            TransitionCategory::LongStretch => 0.14,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            TransitionCategory::SameFinger => "same-finger",
            TransitionCategory::AdjacentFinger => "adjacent-finger",
            TransitionCategory::AlternatingHand => "alternating-hand",
            TransitionCategory::CommonPair => "common-pair",
            TransitionCategory::DiagonalStretch => "diagonal-stretch",
            TransitionCategory::VerticalStretch => "vertical-stretch",
            TransitionCategory::CrossHand => "cross-hand",
            TransitionCategory::LongStretch => "long-stretch",
        }
    }
}

impl fmt::Display for TransitionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Timing profile of a key pair: a midpoint and a symmetric jitter bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyTransition {
    pub category: TransitionCategory,
    /// Midpoint delay in seconds
    pub base_delay: f64,
    /// Jitter bound in seconds, never negative
    pub variability: f64,
}

impl KeyTransition {
    pub fn new(category: TransitionCategory, variability: f64) -> Self {
        debug_assert!(variability >= 0.0, "variability must not be negative");
        Self {
            category,
            base_delay: category.base_delay(),
            variability: variability.max(0.0),
        }
    }

    /// Transition used for pairs the table does not know
    pub fn fallback() -> Self {
        Self::new(TransitionCategory::AlternatingHand, FALLBACK_VARIABILITY)
    }

    /// Draw a fresh delay in seconds from `base_delay ± variability`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.variability == 0.0 {
            return self.base_delay;
        }
        self.base_delay + rng.gen_range(-self.variability..=self.variability)
    }

    /// Inclusive range every sample falls in
    pub fn bounds(&self) -> (f64, f64) {
        (self.base_delay - self.variability, self.base_delay + self.variability)
    }
}
