//! Typing pattern model
//!
//! Maps a pair of consecutive keys to a biomechanically plausible delay,
//! based on the finger movement the pair requires.

mod map;
mod table;

pub use map::{KeyRelationshipTable, TransitionAnalysis, TypingPatternMap};
