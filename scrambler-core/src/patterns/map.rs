use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use rand::Rng;

use super::table::TRANSITIONS;
use crate::types::{Key, KeyTransition, TransitionCategory, KNOWN_KEYS};

/// Source key → destination key → timing profile
pub type KeyRelationshipTable = HashMap<Key, HashMap<Key, KeyTransition>>;

/// Per-key-pair delay model.
///
/// The table is built once and never mutated, so lookups need no locking.
/// Every draw uses its own randomness.
#[derive(Debug, Clone)]
pub struct TypingPatternMap {
    relationships: KeyRelationshipTable,
}

impl Default for TypingPatternMap {
    fn default() -> Self {
        Self::new()
    }
}

impl TypingPatternMap {
    pub fn new() -> Self {
        Self {
            relationships: Self::build_relationships(),
        }
    }

    fn build_relationships() -> KeyRelationshipTable {
        let mut relationships: KeyRelationshipTable = KNOWN_KEYS
            .iter()
            .map(|key| (*key, HashMap::new()))
            .collect();

        for &(from, to, category, jitter) in TRANSITIONS {
            let to = Key::new(to);
            relationships.entry(to).or_default();
            relationships
                .entry(Key::new(from))
                .or_default()
                .insert(to, KeyTransition::new(category, jitter));
        }

        relationships
    }

    /// Explicit transition for the pair, if the table has one
    pub fn transition(&self, from: impl Into<Key>, to: impl Into<Key>) -> Option<&KeyTransition> {
        self.relationships.get(&from.into())?.get(&to.into())
    }

    /// Explicit transition for the pair, or the alternating-hand fallback
    pub fn transition_or_fallback(&self, from: impl Into<Key>, to: impl Into<Key>) -> KeyTransition {
        self.transition(from, to)
            .copied()
            .unwrap_or_else(KeyTransition::fallback)
    }

    /// Sample an inter-key delay for the pair
    pub fn delay_for(&self, from: impl Into<Key>, to: impl Into<Key>) -> Duration {
        self.delay_with(from, to, &mut rand::thread_rng())
    }

    /// Sample an inter-key delay for the pair from the given generator
    pub fn delay_with<R: Rng + ?Sized>(
        &self,
        from: impl Into<Key>,
        to: impl Into<Key>,
        rng: &mut R,
    ) -> Duration {
        let seconds = self.transition_or_fallback(from, to).sample(rng);
        Duration::from_secs_f64(seconds.max(0.0))
    }

    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.relationships.contains_key(&key.into())
    }

    /// Destinations with an explicit transition from `key`
    pub fn successors(&self, key: impl Into<Key>) -> Option<&HashMap<Key, KeyTransition>> {
        self.relationships.get(&key.into())
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.relationships.keys().copied()
    }

    /// Every explicit `(from, to, transition)` triple
    pub fn pairs(&self) -> impl Iterator<Item = (Key, Key, &KeyTransition)> + '_ {
        self.relationships.iter().flat_map(|(from, inner)| {
            inner.iter().map(move |(to, transition)| (*from, *to, transition))
        })
    }

    /// Sample the pair once and describe where the sample came from
    pub fn analyze_transition(&self, from: impl Into<Key>, to: impl Into<Key>) -> TransitionAnalysis {
        let (from, to) = (from.into(), to.into());
        let explicit = self.transition(from, to).copied();
        let transition = explicit.unwrap_or_else(KeyTransition::fallback);
        let seconds = transition.sample(&mut rand::thread_rng()).max(0.0);

        TransitionAnalysis {
            from,
            to,
            delay: Duration::from_secs_f64(seconds),
            category: transition.category,
            bounds: transition.bounds(),
            has_mapping: explicit.is_some(),
        }
    }
}

/// One sampled transition together with the profile it came from
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionAnalysis {
    pub from: Key,
    pub to: Key,
    pub delay: Duration,
    pub category: TransitionCategory,
    pub bounds: (f64, f64),
    pub has_mapping: bool,
}

impl fmt::Display for TransitionAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transition Analysis:")?;
        writeln!(f, "  From key: {}", self.from)?;
        writeln!(f, "  To key: {}", self.to)?;
        writeln!(f, "  Category: {}", self.category)?;
        writeln!(f, "  Delay: {:.3}s", self.delay.as_secs_f64())?;
        writeln!(f, "  Range: {:.3}s - {:.3}s", self.bounds.0, self.bounds.1)?;
        write!(f, "  Has explicit mapping: {}", self.has_mapping)
    }
}
