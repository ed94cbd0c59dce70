use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;

use crate::patterns::TypingPatternMap;
use crate::types::{Key, KeyTransition};
use crate::{Error, Result};

/// Magnitude the delay models are calibrated for, in seconds.
/// A user base delay of this value leaves samples unscaled.
pub const REFERENCE_BASE_DELAY: f64 = 0.1;

/// Jitter of the flat model, in seconds
pub const FLAT_VARIABILITY: f64 = 0.02;

/// How the engine picks a delay for each key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelayModel {
    /// Key-pair aware: the transition from the previous key to this one
    #[default]
    PairAware,
    /// One distribution for every key, `0.1 ± 0.02` seconds
    Flat,
}

impl DelayModel {
    /// Sample an unscaled delay in seconds
    pub fn sample<R: Rng + ?Sized>(
        &self,
        patterns: &TypingPatternMap,
        previous: Option<Key>,
        current: Option<Key>,
        rng: &mut R,
    ) -> f64 {
        match (self, previous, current) {
            (DelayModel::Flat, _, _) => {
                REFERENCE_BASE_DELAY + rng.gen_range(-FLAT_VARIABILITY..=FLAT_VARIABILITY)
            }
            (DelayModel::PairAware, Some(from), Some(to)) => {
                patterns.transition_or_fallback(from, to).sample(rng)
            }
            (DelayModel::PairAware, _, _) => KeyTransition::fallback().sample(rng),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DelayModel::PairAware => "pair-aware",
            DelayModel::Flat => "flat",
        }
    }
}

impl fmt::Display for DelayModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DelayModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pair-aware" | "pair_aware" | "pairs" => Ok(DelayModel::PairAware),
            "flat" => Ok(DelayModel::Flat),
            other => Err(Error::InvalidConfig(format!("Unknown delay model: {}", other))),
        }
    }
}

/// Scale a sampled delay by the user's base delay.
///
/// The base delay stretches the sample proportionally instead of replacing
/// it. Negative samples clamp to zero; NaN and delays too large for a
/// `Duration` are errors.
pub fn scale_delay(sample_seconds: f64, base_delay: f64) -> Result<Duration> {
    let seconds = sample_seconds * (base_delay / REFERENCE_BASE_DELAY);
    // NaN falls through to the range check
    let seconds = if seconds < 0.0 { 0.0 } else { seconds };
    Duration::try_from_secs_f64(seconds).map_err(|_| {
        Error::InvalidConfig(format!(
            "Delay out of range (sample {}, base delay {})",
            sample_seconds, base_delay
        ))
    })
}
