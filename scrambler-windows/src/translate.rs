//! Conversion between hook data and replayable input

use scrambler_core::{KeyEvent, ModifierState};

/// How a swallowed key is sent back to the focused window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayPlan {
    /// Typed text, sent as UTF-16 code units
    Unicode(Vec<u16>),
    /// Control characters (Enter, Tab, Backspace) only act as real key
    /// presses, so they are replayed by virtual key code
    VirtualKey(u16),
}

impl ReplayPlan {
    pub fn for_event(event: &KeyEvent) -> Option<Self> {
        if event.characters.is_empty() {
            return None;
        }
        if event.characters.chars().any(char::is_control) {
            if event.key_code == 0 {
                return None;
            }
            return Some(ReplayPlan::VirtualKey(event.key_code));
        }
        Some(ReplayPlan::Unicode(event.characters.encode_utf16().collect()))
    }

    /// Number of INPUT records needed: one down and one up per unit
    pub fn input_count(&self) -> usize {
        match self {
            ReplayPlan::Unicode(units) => units.len() * 2,
            ReplayPlan::VirtualKey(_) => 2,
        }
    }
}

/// Decode the UTF-16 output of a key translation.
/// A negative count is a dead key, which produces nothing on its own.
pub fn decode_translation(buffer: &[u16], written: i32) -> String {
    if written <= 0 {
        return String::new();
    }
    let len = (written as usize).min(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}

/// Synthetic keyboard state for translating a key from the hook thread.
///
/// The hook thread has no keyboard state of its own, so the bytes the
/// layout needs are rebuilt from the live modifier state.
pub fn keyboard_state(modifiers: &ModifierState) -> [u8; 256] {
    const VK_SHIFT: usize = 0x10;
    const VK_CONTROL: usize = 0x11;
    const VK_MENU: usize = 0x12;
    const VK_CAPITAL: usize = 0x14;
    const DOWN: u8 = 0x80;
    const TOGGLED: u8 = 0x01;

    let mut state = [0u8; 256];
    if modifiers.shift {
        state[VK_SHIFT] = DOWN;
    }
    if modifiers.ctrl {
        state[VK_CONTROL] = DOWN;
    }
    if modifiers.alt {
        state[VK_MENU] = DOWN;
    }
    if modifiers.caps_lock {
        state[VK_CAPITAL] = TOGGLED;
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_is_replayed_as_unicode() {
        let plan = ReplayPlan::for_event(&KeyEvent::new(0x41, ModifierState::default(), "a"));
        assert_eq!(plan, Some(ReplayPlan::Unicode(vec![0x61])));
        assert_eq!(plan.map(|p| p.input_count()), Some(2));
    }

    #[test]
    fn test_surrogate_pairs_need_two_units() {
        let plan = ReplayPlan::for_event(&KeyEvent::from_char('😀')).unwrap();
        assert_eq!(plan.input_count(), 4);
    }

    #[test]
    fn test_control_characters_use_virtual_key() {
        let enter = KeyEvent::new(0x0D, ModifierState::default(), "\r");
        assert_eq!(ReplayPlan::for_event(&enter), Some(ReplayPlan::VirtualKey(0x0D)));
    }

    #[test]
    fn test_empty_payload_has_no_plan() {
        let shift = KeyEvent::from_key_code(0x10, ModifierState::default());
        assert_eq!(ReplayPlan::for_event(&shift), None);
    }

    #[test]
    fn test_dead_key_decodes_to_nothing() {
        assert_eq!(decode_translation(&[0x5E, 0], -1), "");
        assert_eq!(decode_translation(&[0x68, 0x69], 2), "hi");
        assert_eq!(decode_translation(&[0x68], 5), "h");
    }

    #[test]
    fn test_keyboard_state_for_alt_gr() {
        let state = keyboard_state(&ModifierState::new(false, true, true, false, true));
        assert_eq!(state[0x11], 0x80);
        assert_eq!(state[0x12], 0x80);
        assert_eq!(state[0x14], 0x01);
        assert_eq!(state[0x10], 0);
    }
}
