//! Key events as delivered by the OS input layer

use crate::types::Key;

/// A key-down notification captured by the global monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Platform virtual key code
    pub key_code: u16,
    /// Modifier keys held when the key went down
    pub modifiers: ModifierState,
    /// Character payload produced by the key, empty for pure modifiers
    pub characters: String,
    /// Set when the event was synthesized rather than physically typed
    pub injected: bool,
}

impl KeyEvent {
    /// Creates a new physical key event
    pub fn new(key_code: u16, modifiers: ModifierState, characters: impl Into<String>) -> Self {
        Self {
            key_code,
            modifiers,
            characters: characters.into(),
            injected: false,
        }
    }

    /// Creates a simple character event without modifiers
    pub fn from_char(ch: char) -> Self {
        Self::new(0, ModifierState::default(), ch.to_string())
    }

    /// Creates an event for a key that produces no characters
    pub fn from_key_code(key_code: u16, modifiers: ModifierState) -> Self {
        Self::new(key_code, modifiers, String::new())
    }

    /// Marks the event as synthetic
    pub fn as_injected(mut self) -> Self {
        self.injected = true;
        self
    }

    /// Text payload eligible for scrambling.
    ///
    /// Shortcut chords are left alone: replaying their bare characters would
    /// turn Ctrl+C into a typed "c".
    pub fn text(&self) -> Option<&str> {
        if self.characters.is_empty() || self.modifiers.is_shortcut() {
            return None;
        }
        Some(&self.characters)
    }

    /// Key identity used for pair lookups
    pub fn key(&self) -> Option<Key> {
        self.text().and_then(Key::from_characters)
    }
}

/// State of modifier keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModifierState {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Command on macOS, Windows key elsewhere
    pub meta: bool,
    pub caps_lock: bool,
}

impl ModifierState {
    /// Creates a new modifier state
    pub fn new(shift: bool, ctrl: bool, alt: bool, meta: bool, caps_lock: bool) -> Self {
        Self {
            shift,
            ctrl,
            alt,
            meta,
            caps_lock,
        }
    }

    /// Checks if any modifier is active
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }

    /// Whether the held modifiers turn the key into a shortcut.
    /// AltGr arrives as Ctrl+Alt and still produces text.
    pub fn is_shortcut(&self) -> bool {
        let alt_gr = self.ctrl && self.alt;
        self.meta || ((self.ctrl || self.alt) && !alt_gr)
    }
}
