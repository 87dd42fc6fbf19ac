//! Synergy/Barrier KeyButton to HID usage translation.
//!
//! The server reports the *physical* key in the `key_button` field of every
//! key event, carried in the Linux scancode set (the set a Barrier or
//! Deskflow primary built on evdev emits). This table maps those scancodes
//! onto HID usages; [`super::evdev`] completes the trip to a local code.
//!
//! Mouse buttons have no scancode of their own. They enter this table as the
//! synthetic code `(button << 8) | 0xAA`, which cannot collide with any real
//! scancode (all of which are below 0x300 with a low byte that is never
//! chosen by us — the 0xAA tag byte marks the synthetic range explicitly).
//! Synergy numbers buttons left = 1, middle = 2, right = 3; the HID Button
//! page orders primary (left), secondary (right), tertiary (middle), so
//! entries 2 and 3 cross over.

use super::hid::usage;

/// Tag byte marking a synthetic mouse-button code.
pub const BUTTON_TAG: u16 = 0xAA;

/// Builds the synthetic KeyButton code for a protocol mouse button.
pub fn mouse_button_code(button: u8) -> u16 {
    ((button as u16) << 8) | BUTTON_TAG
}

/// KeyButton (Linux scancode set) → HID usage, sorted by scancode.
static KEY_TABLE: &[(u16, u16)] = &[
    (1, usage::ESCAPE),
    (2, usage::DIGIT_1),
    (3, usage::DIGIT_2),
    (4, usage::DIGIT_3),
    (5, usage::DIGIT_4),
    (6, usage::DIGIT_5),
    (7, usage::DIGIT_6),
    (8, usage::DIGIT_7),
    (9, usage::DIGIT_8),
    (10, usage::DIGIT_9),
    (11, usage::DIGIT_0),
    (12, usage::MINUS),
    (13, usage::EQUAL),
    (14, usage::BACKSPACE),
    (15, usage::TAB),
    (16, usage::Q),
    (17, usage::W),
    (18, usage::E),
    (19, usage::R),
    (20, usage::T),
    (21, usage::Y),
    (22, usage::U),
    (23, usage::I),
    (24, usage::O),
    (25, usage::P),
    (26, usage::BRACKET_LEFT),
    (27, usage::BRACKET_RIGHT),
    (28, usage::ENTER),
    (29, usage::CONTROL_LEFT),
    (30, usage::A),
    (31, usage::S),
    (32, usage::D),
    (33, usage::F),
    (34, usage::G),
    (35, usage::H),
    (36, usage::J),
    (37, usage::K),
    (38, usage::L),
    (39, usage::SEMICOLON),
    (40, usage::QUOTE),
    (41, usage::BACKQUOTE),
    (42, usage::SHIFT_LEFT),
    (43, usage::BACKSLASH),
    (44, usage::Z),
    (45, usage::X),
    (46, usage::C),
    (47, usage::V),
    (48, usage::B),
    (49, usage::N),
    (50, usage::M),
    (51, usage::COMMA),
    (52, usage::PERIOD),
    (53, usage::SLASH),
    (54, usage::SHIFT_RIGHT),
    (55, usage::KEYPAD_MULTIPLY),
    (56, usage::ALT_LEFT),
    (57, usage::SPACE),
    (58, usage::CAPS_LOCK),
    (59, usage::F1),
    (60, usage::F2),
    (61, usage::F3),
    (62, usage::F4),
    (63, usage::F5),
    (64, usage::F6),
    (65, usage::F7),
    (66, usage::F8),
    (67, usage::F9),
    (68, usage::F10),
    (69, usage::NUM_LOCK),
    (70, usage::SCROLL_LOCK),
    (71, usage::KEYPAD_7),
    (72, usage::KEYPAD_8),
    (73, usage::KEYPAD_9),
    (74, usage::KEYPAD_SUBTRACT),
    (75, usage::KEYPAD_4),
    (76, usage::KEYPAD_5),
    (77, usage::KEYPAD_6),
    (78, usage::KEYPAD_ADD),
    (79, usage::KEYPAD_1),
    (80, usage::KEYPAD_2),
    (81, usage::KEYPAD_3),
    (82, usage::KEYPAD_0),
    (83, usage::KEYPAD_DECIMAL),
    (87, usage::F11),
    (88, usage::F12),
    (96, usage::KEYPAD_ENTER),
    (97, usage::CONTROL_RIGHT),
    (98, usage::KEYPAD_DIVIDE),
    (99, usage::PRINT_SCREEN),
    (100, usage::ALT_RIGHT),
    (102, usage::HOME),
    (103, usage::ARROW_UP),
    (104, usage::PAGE_UP),
    (105, usage::ARROW_LEFT),
    (106, usage::ARROW_RIGHT),
    (107, usage::END),
    (108, usage::ARROW_DOWN),
    (109, usage::PAGE_DOWN),
    (110, usage::INSERT),
    (111, usage::DELETE),
    (119, usage::PAUSE),
    (125, usage::META_LEFT),
    (126, usage::META_RIGHT),
    (127, usage::CONTEXT_MENU),
];

/// Synergy button number → HID Button-page usage.
static BUTTON_TABLE: &[(u8, u16)] = &[
    (1, usage::BUTTON_PRIMARY),
    (2, usage::BUTTON_TERTIARY),
    (3, usage::BUTTON_SECONDARY),
    (4, usage::BUTTON_4),
    (5, usage::BUTTON_5),
    (6, usage::BUTTON_6),
    (7, usage::BUTTON_7),
    (8, usage::BUTTON_8),
];

/// Translates a KeyButton (or a synthetic mouse-button code) to a HID usage.
///
/// Returns `None` when the key has no mapping; the injector drops such
/// events with a warning rather than guessing.
pub fn key_button_to_hid(key_button: u16) -> Option<u16> {
    if key_button & 0x00FF == BUTTON_TAG {
        let button = (key_button >> 8) as u8;
        return BUTTON_TABLE
            .iter()
            .find(|(b, _)| *b == button)
            .map(|(_, hid)| *hid);
    }
    KEY_TABLE
        .binary_search_by_key(&key_button, |(kb, _)| *kb)
        .ok()
        .map(|i| KEY_TABLE[i].1)
}

/// Inverse lookup; exists for tests only.
pub fn hid_to_key_button(hid: u16) -> Option<u16> {
    if let Some((button, _)) = BUTTON_TABLE.iter().find(|(_, h)| *h == hid) {
        return Some(mouse_button_code(*button));
    }
    KEY_TABLE
        .iter()
        .find(|(_, h)| *h == hid)
        .map(|(kb, _)| *kb)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_table_is_sorted_for_binary_search() {
        for pair in KEY_TABLE.windows(2) {
            assert!(
                pair[0].0 < pair[1].0,
                "table must be strictly ascending: {:?} before {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_letter_row_maps_to_hid_letters() {
        assert_eq!(key_button_to_hid(30), Some(usage::A));
        assert_eq!(key_button_to_hid(31), Some(usage::S));
        assert_eq!(key_button_to_hid(44), Some(usage::Z));
    }

    #[test]
    fn test_unmapped_scancode_is_none() {
        assert_eq!(key_button_to_hid(0), None);
        assert_eq!(key_button_to_hid(0x5000), None);
    }

    #[test]
    fn test_mouse_button_synthetic_codes() {
        assert_eq!(mouse_button_code(1), 0x01AA);
        assert_eq!(mouse_button_code(3), 0x03AA);
        assert_eq!(key_button_to_hid(0x01AA), Some(usage::BUTTON_PRIMARY));
        // Synergy's middle (2) is HID's tertiary; right (3) is secondary.
        assert_eq!(key_button_to_hid(0x02AA), Some(usage::BUTTON_TERTIARY));
        assert_eq!(key_button_to_hid(0x03AA), Some(usage::BUTTON_SECONDARY));
        assert_eq!(key_button_to_hid(0x09AA), None);
    }

    #[test]
    fn test_inverse_round_trips_every_entry() {
        for (kb, hid) in KEY_TABLE {
            assert_eq!(hid_to_key_button(*hid), Some(*kb));
        }
        for (button, hid) in BUTTON_TABLE {
            assert_eq!(hid_to_key_button(*hid), Some(mouse_button_code(*button)));
        }
    }
}
