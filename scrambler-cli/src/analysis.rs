use std::fmt;
use std::time::Duration;

use anyhow::{bail, Result};
use scrambler_core::engine::preview_delay;
use scrambler_core::{DelayModel, Key, TypingPatternMap};

use crate::config::validate_base_delay_ms;

/// Spread of sampled delays for one key pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelaySummary {
    pub model: DelayModel,
    pub base_delay_ms: u64,
    pub samples: usize,
    pub min: Duration,
    pub mean: Duration,
    pub max: Duration,
}

/// Parse a key argument such as `t` or `;`
pub fn parse_key(text: &str) -> Result<Key> {
    match Key::from_characters(text) {
        Some(key) => Ok(key),
        None => bail!("Expected a single character, got {:?}", text),
    }
}

/// Draw `samples` delays for `from → to` the way the engine would
pub fn sample_summary(
    patterns: &TypingPatternMap,
    model: DelayModel,
    base_delay_ms: u64,
    from: Key,
    to: Key,
    samples: usize,
) -> Result<DelaySummary> {
    validate_base_delay_ms(base_delay_ms)?;
    if samples == 0 {
        bail!("Need at least one sample");
    }
    let count = u32::try_from(samples)?;

    let base_delay = base_delay_ms as f64 / 1000.0;
    let mut min = Duration::MAX;
    let mut max = Duration::ZERO;
    let mut total = Duration::ZERO;
    for _ in 0..samples {
        let delay = preview_delay(patterns, model, base_delay, Some(from), Some(to))?;
        min = min.min(delay);
        max = max.max(delay);
        total += delay;
    }

    Ok(DelaySummary {
        model,
        base_delay_ms,
        samples,
        min,
        mean: total / count,
        max,
    })
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

impl fmt::Display for DelaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} samples at base delay {} ms ({} model):",
            self.samples, self.base_delay_ms, self.model
        )?;
        writeln!(f, "  Min: {:.1} ms", millis(self.min))?;
        writeln!(f, "  Mean: {:.1} ms", millis(self.mean))?;
        write!(f, "  Max: {:.1} ms", millis(self.max))
    }
}
