//! Static key relationship table (QWERTY)

use crate::types::TransitionCategory::{self, *};

/// `(from, to, category, jitter seconds)`
pub(crate) type TransitionEntry = (char, char, TransitionCategory, f64);

pub(crate) const TRANSITIONS: &[TransitionEntry] = &[
    // Left hand, top row to home row and beyond
    ('q', 'a', VerticalStretch, 0.02),
    ('q', 'z', LongStretch, 0.03),
    ('q', 'w', AdjacentFinger, 0.02),
    ('w', 's', VerticalStretch, 0.02),
    ('w', 'x', LongStretch, 0.02),
    ('w', 'e', AdjacentFinger, 0.02),
    ('e', 'd', VerticalStretch, 0.02),
    ('e', 'f', DiagonalStretch, 0.02),
    ('r', 'f', VerticalStretch, 0.02),
    ('r', 'g', DiagonalStretch, 0.02),
    ('r', 't', SameFinger, 0.02),
    // Left hand, home row to bottom row
    ('d', 'c', VerticalStretch, 0.02),
    ('f', 'v', VerticalStretch, 0.02),
    ('f', 'g', SameFinger, 0.02),
    // Right hand index finger
    ('u', 'y', SameFinger, 0.02),
    ('j', 'h', SameFinger, 0.02),
    // Common bigrams
    ('t', 'h', CommonPair, 0.01),
    ('t', 'e', CommonPair, 0.01),
    ('h', 'e', CommonPair, 0.01),
    // Difficult combinations
    ('z', 'p', LongStretch, 0.03),
    ('z', 'o', LongStretch, 0.03),
    ('b', 'y', CrossHand, 0.03),
    ('b', 'u', DiagonalStretch, 0.03),
];
