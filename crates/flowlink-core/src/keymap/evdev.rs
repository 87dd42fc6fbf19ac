//! HID usage to Linux evdev code translation.
//!
//! The evdev codes are the `KEY_*`/`BTN_*` values from
//! `linux/input-event-codes.h`; they are what a uinput virtual keyboard or
//! mouse writes into the kernel.

use super::hid::usage;

/// The evdev key and button codes this crate needs, named as in
/// `linux/input-event-codes.h`.
pub mod ecodes {
    pub const KEY_ESC: u16 = 1;
    pub const KEY_1: u16 = 2;
    pub const KEY_2: u16 = 3;
    pub const KEY_3: u16 = 4;
    pub const KEY_4: u16 = 5;
    pub const KEY_5: u16 = 6;
    pub const KEY_6: u16 = 7;
    pub const KEY_7: u16 = 8;
    pub const KEY_8: u16 = 9;
    pub const KEY_9: u16 = 10;
    pub const KEY_0: u16 = 11;
    pub const KEY_MINUS: u16 = 12;
    pub const KEY_EQUAL: u16 = 13;
    pub const KEY_BACKSPACE: u16 = 14;
    pub const KEY_TAB: u16 = 15;
    pub const KEY_Q: u16 = 16;
    pub const KEY_W: u16 = 17;
    pub const KEY_E: u16 = 18;
    pub const KEY_R: u16 = 19;
    pub const KEY_T: u16 = 20;
    pub const KEY_Y: u16 = 21;
    pub const KEY_U: u16 = 22;
    pub const KEY_I: u16 = 23;
    pub const KEY_O: u16 = 24;
    pub const KEY_P: u16 = 25;
    pub const KEY_LEFTBRACE: u16 = 26;
    pub const KEY_RIGHTBRACE: u16 = 27;
    pub const KEY_ENTER: u16 = 28;
    pub const KEY_LEFTCTRL: u16 = 29;
    pub const KEY_A: u16 = 30;
    pub const KEY_S: u16 = 31;
    pub const KEY_D: u16 = 32;
    pub const KEY_F: u16 = 33;
    pub const KEY_G: u16 = 34;
    pub const KEY_H: u16 = 35;
    pub const KEY_J: u16 = 36;
    pub const KEY_K: u16 = 37;
    pub const KEY_L: u16 = 38;
    pub const KEY_SEMICOLON: u16 = 39;
    pub const KEY_APOSTROPHE: u16 = 40;
    pub const KEY_GRAVE: u16 = 41;
    pub const KEY_LEFTSHIFT: u16 = 42;
    pub const KEY_BACKSLASH: u16 = 43;
    pub const KEY_Z: u16 = 44;
    pub const KEY_X: u16 = 45;
    pub const KEY_C: u16 = 46;
    pub const KEY_V: u16 = 47;
    pub const KEY_B: u16 = 48;
    pub const KEY_N: u16 = 49;
    pub const KEY_M: u16 = 50;
    pub const KEY_COMMA: u16 = 51;
    pub const KEY_DOT: u16 = 52;
    pub const KEY_SLASH: u16 = 53;
    pub const KEY_RIGHTSHIFT: u16 = 54;
    pub const KEY_KPASTERISK: u16 = 55;
    pub const KEY_LEFTALT: u16 = 56;
    pub const KEY_SPACE: u16 = 57;
    pub const KEY_CAPSLOCK: u16 = 58;
    pub const KEY_F1: u16 = 59;
    pub const KEY_F2: u16 = 60;
    pub const KEY_F3: u16 = 61;
    pub const KEY_F4: u16 = 62;
    pub const KEY_F5: u16 = 63;
    pub const KEY_F6: u16 = 64;
    pub const KEY_F7: u16 = 65;
    pub const KEY_F8: u16 = 66;
    pub const KEY_F9: u16 = 67;
    pub const KEY_F10: u16 = 68;
    pub const KEY_NUMLOCK: u16 = 69;
    pub const KEY_SCROLLLOCK: u16 = 70;
    pub const KEY_KP7: u16 = 71;
    pub const KEY_KP8: u16 = 72;
    pub const KEY_KP9: u16 = 73;
    pub const KEY_KPMINUS: u16 = 74;
    pub const KEY_KP4: u16 = 75;
    pub const KEY_KP5: u16 = 76;
    pub const KEY_KP6: u16 = 77;
    pub const KEY_KPPLUS: u16 = 78;
    pub const KEY_KP1: u16 = 79;
    pub const KEY_KP2: u16 = 80;
    pub const KEY_KP3: u16 = 81;
    pub const KEY_KP0: u16 = 82;
    pub const KEY_KPDOT: u16 = 83;
    pub const KEY_F11: u16 = 87;
    pub const KEY_F12: u16 = 88;
    pub const KEY_KPENTER: u16 = 96;
    pub const KEY_RIGHTCTRL: u16 = 97;
    pub const KEY_KPSLASH: u16 = 98;
    pub const KEY_SYSRQ: u16 = 99;
    pub const KEY_RIGHTALT: u16 = 100;
    pub const KEY_HOME: u16 = 102;
    pub const KEY_UP: u16 = 103;
    pub const KEY_PAGEUP: u16 = 104;
    pub const KEY_LEFT: u16 = 105;
    pub const KEY_RIGHT: u16 = 106;
    pub const KEY_END: u16 = 107;
    pub const KEY_DOWN: u16 = 108;
    pub const KEY_PAGEDOWN: u16 = 109;
    pub const KEY_INSERT: u16 = 110;
    pub const KEY_DELETE: u16 = 111;
    pub const KEY_PAUSE: u16 = 119;
    pub const KEY_LEFTMETA: u16 = 125;
    pub const KEY_RIGHTMETA: u16 = 126;
    pub const KEY_COMPOSE: u16 = 127;

    pub const BTN_LEFT: u16 = 0x110;
    pub const BTN_RIGHT: u16 = 0x111;
    pub const BTN_MIDDLE: u16 = 0x112;
    pub const BTN_SIDE: u16 = 0x113;
    pub const BTN_EXTRA: u16 = 0x114;
    pub const BTN_FORWARD: u16 = 0x115;
    pub const BTN_BACK: u16 = 0x116;
    pub const BTN_TASK: u16 = 0x117;
}

use ecodes::*;

/// HID usage → evdev code, sorted by usage value.
static EVDEV_TABLE: &[(u16, u16)] = &[
    (usage::A, KEY_A),
    (usage::B, KEY_B),
    (usage::C, KEY_C),
    (usage::D, KEY_D),
    (usage::E, KEY_E),
    (usage::F, KEY_F),
    (usage::G, KEY_G),
    (usage::H, KEY_H),
    (usage::I, KEY_I),
    (usage::J, KEY_J),
    (usage::K, KEY_K),
    (usage::L, KEY_L),
    (usage::M, KEY_M),
    (usage::N, KEY_N),
    (usage::O, KEY_O),
    (usage::P, KEY_P),
    (usage::Q, KEY_Q),
    (usage::R, KEY_R),
    (usage::S, KEY_S),
    (usage::T, KEY_T),
    (usage::U, KEY_U),
    (usage::V, KEY_V),
    (usage::W, KEY_W),
    (usage::X, KEY_X),
    (usage::Y, KEY_Y),
    (usage::Z, KEY_Z),
    (usage::DIGIT_1, KEY_1),
    (usage::DIGIT_2, KEY_2),
    (usage::DIGIT_3, KEY_3),
    (usage::DIGIT_4, KEY_4),
    (usage::DIGIT_5, KEY_5),
    (usage::DIGIT_6, KEY_6),
    (usage::DIGIT_7, KEY_7),
    (usage::DIGIT_8, KEY_8),
    (usage::DIGIT_9, KEY_9),
    (usage::DIGIT_0, KEY_0),
    (usage::ENTER, KEY_ENTER),
    (usage::ESCAPE, KEY_ESC),
    (usage::BACKSPACE, KEY_BACKSPACE),
    (usage::TAB, KEY_TAB),
    (usage::SPACE, KEY_SPACE),
    (usage::MINUS, KEY_MINUS),
    (usage::EQUAL, KEY_EQUAL),
    (usage::BRACKET_LEFT, KEY_LEFTBRACE),
    (usage::BRACKET_RIGHT, KEY_RIGHTBRACE),
    (usage::BACKSLASH, KEY_BACKSLASH),
    (usage::SEMICOLON, KEY_SEMICOLON),
    (usage::QUOTE, KEY_APOSTROPHE),
    (usage::BACKQUOTE, KEY_GRAVE),
    (usage::COMMA, KEY_COMMA),
    (usage::PERIOD, KEY_DOT),
    (usage::SLASH, KEY_SLASH),
    (usage::CAPS_LOCK, KEY_CAPSLOCK),
    (usage::F1, KEY_F1),
    (usage::F2, KEY_F2),
    (usage::F3, KEY_F3),
    (usage::F4, KEY_F4),
    (usage::F5, KEY_F5),
    (usage::F6, KEY_F6),
    (usage::F7, KEY_F7),
    (usage::F8, KEY_F8),
    (usage::F9, KEY_F9),
    (usage::F10, KEY_F10),
    (usage::F11, KEY_F11),
    (usage::F12, KEY_F12),
    (usage::PRINT_SCREEN, KEY_SYSRQ),
    (usage::SCROLL_LOCK, KEY_SCROLLLOCK),
    (usage::PAUSE, KEY_PAUSE),
    (usage::INSERT, KEY_INSERT),
    (usage::HOME, KEY_HOME),
    (usage::PAGE_UP, KEY_PAGEUP),
    (usage::DELETE, KEY_DELETE),
    (usage::END, KEY_END),
    (usage::PAGE_DOWN, KEY_PAGEDOWN),
    (usage::ARROW_RIGHT, KEY_RIGHT),
    (usage::ARROW_LEFT, KEY_LEFT),
    (usage::ARROW_DOWN, KEY_DOWN),
    (usage::ARROW_UP, KEY_UP),
    (usage::NUM_LOCK, KEY_NUMLOCK),
    (usage::KEYPAD_DIVIDE, KEY_KPSLASH),
    (usage::KEYPAD_MULTIPLY, KEY_KPASTERISK),
    (usage::KEYPAD_SUBTRACT, KEY_KPMINUS),
    (usage::KEYPAD_ADD, KEY_KPPLUS),
    (usage::KEYPAD_ENTER, KEY_KPENTER),
    (usage::KEYPAD_1, KEY_KP1),
    (usage::KEYPAD_2, KEY_KP2),
    (usage::KEYPAD_3, KEY_KP3),
    (usage::KEYPAD_4, KEY_KP4),
    (usage::KEYPAD_5, KEY_KP5),
    (usage::KEYPAD_6, KEY_KP6),
    (usage::KEYPAD_7, KEY_KP7),
    (usage::KEYPAD_8, KEY_KP8),
    (usage::KEYPAD_9, KEY_KP9),
    (usage::KEYPAD_0, KEY_KP0),
    (usage::KEYPAD_DECIMAL, KEY_KPDOT),
    (usage::CONTEXT_MENU, KEY_COMPOSE),
    (usage::CONTROL_LEFT, KEY_LEFTCTRL),
    (usage::SHIFT_LEFT, KEY_LEFTSHIFT),
    (usage::ALT_LEFT, KEY_LEFTALT),
    (usage::META_LEFT, KEY_LEFTMETA),
    (usage::CONTROL_RIGHT, KEY_RIGHTCTRL),
    (usage::SHIFT_RIGHT, KEY_RIGHTSHIFT),
    (usage::ALT_RIGHT, KEY_RIGHTALT),
    (usage::META_RIGHT, KEY_RIGHTMETA),
    (usage::BUTTON_PRIMARY, BTN_LEFT),
    (usage::BUTTON_SECONDARY, BTN_RIGHT),
    (usage::BUTTON_TERTIARY, BTN_MIDDLE),
    (usage::BUTTON_4, BTN_SIDE),
    (usage::BUTTON_5, BTN_EXTRA),
    (usage::BUTTON_6, BTN_FORWARD),
    (usage::BUTTON_7, BTN_BACK),
    (usage::BUTTON_8, BTN_TASK),
];

/// Translates a HID usage to the local evdev code.
///
/// Returns `None` when there is no local equivalent.
pub fn hid_to_evdev(hid: u16) -> Option<u16> {
    EVDEV_TABLE
        .binary_search_by_key(&hid, |(h, _)| *h)
        .ok()
        .map(|i| EVDEV_TABLE[i].1)
}

/// Inverse lookup; exists for tests only.
pub fn evdev_to_hid(code: u16) -> Option<u16> {
    EVDEV_TABLE.iter().find(|(_, c)| *c == code).map(|(h, _)| *h)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evdev_table_is_sorted_for_binary_search() {
        for pair in EVDEV_TABLE.windows(2) {
            assert!(
                pair[0].0 < pair[1].0,
                "table must be strictly ascending: {:?} before {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_keyboard_usages_reach_expected_ecodes() {
        assert_eq!(hid_to_evdev(usage::A), Some(KEY_A));
        assert_eq!(hid_to_evdev(usage::ENTER), Some(KEY_ENTER));
        assert_eq!(hid_to_evdev(usage::CAPS_LOCK), Some(KEY_CAPSLOCK));
        assert_eq!(hid_to_evdev(usage::META_RIGHT), Some(KEY_RIGHTMETA));
    }

    #[test]
    fn test_button_usages_reach_btn_codes() {
        assert_eq!(hid_to_evdev(usage::BUTTON_PRIMARY), Some(BTN_LEFT));
        assert_eq!(hid_to_evdev(usage::BUTTON_SECONDARY), Some(BTN_RIGHT));
        assert_eq!(hid_to_evdev(usage::BUTTON_TERTIARY), Some(BTN_MIDDLE));
    }

    #[test]
    fn test_unmapped_usage_is_none() {
        assert_eq!(hid_to_evdev(0x0000), None);
        assert_eq!(hid_to_evdev(0x00FF), None);
    }

    #[test]
    fn test_inverse_round_trips_every_entry() {
        for (hid, code) in EVDEV_TABLE {
            assert_eq!(evdev_to_hid(*code), Some(*hid));
        }
    }
}
