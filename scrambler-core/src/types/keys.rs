use std::fmt;

/// Character-level identity of a physical key.
///
/// ASCII letters are folded to lowercase: `'T'` and `'t'` come from the same
/// key, and the shift state plays no part in the finger movement between two
/// keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(char);

impl Key {
    pub const fn new(ch: char) -> Self {
        Key(ch.to_ascii_lowercase())
    }

    /// Key for an OS character payload; only single-character payloads name a key
    pub fn from_characters(characters: &str) -> Option<Self> {
        let mut chars = characters.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Some(Key::new(ch)),
            _ => None,
        }
    }

    pub const fn as_char(self) -> char {
        self.0
    }

    /// Whether the key belongs to the fixed key set
    pub fn is_known(self) -> bool {
        KNOWN_KEYS.contains(&self)
    }
}

impl From<char> for Key {
    fn from(ch: char) -> Self {
        Key::new(ch)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed key set covered by the relationship table
pub const KNOWN_KEYS: [Key; 26] = [
    // Home row, left to right as a typist reaches for them
    Key('a'), Key('s'), Key('d'), Key('f'), Key('h'), Key('g'),
    // Bottom row, left hand
    Key('z'), Key('x'), Key('c'), Key('v'), Key('b'),
    // Top row
    Key('q'), Key('w'), Key('e'), Key('r'), Key('t'),
    Key('y'), Key('u'), Key('i'), Key('o'), Key('p'),
    // Remaining right-hand keys
    Key('n'), Key('m'), Key('k'), Key('j'), Key('l'),
];
