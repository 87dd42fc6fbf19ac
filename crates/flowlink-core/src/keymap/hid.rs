//! USB HID usage IDs used as the intermediate key representation.
//!
//! The injector never maps the server's KeyButton straight to a local code;
//! it goes through HID usages (Keyboard/Keypad page 0x07) so that each side
//! of the translation is a table against a stable, documented standard.
//!
//! A usage here is a plain `u16`. Keyboard usages are the page-0x07 value as
//! published in the USB HID Usage Tables (letter A is 0x04, Enter is 0x28,
//! Left Ctrl is 0xE0 — position codes, not characters). Mouse buttons live
//! on the Button page (0x09) and are carried as `0x0900 | usage` so the two
//! pages cannot collide in one table.
//!
//! Reference: USB HID Usage Tables 1.3, sections 10 (Keyboard/Keypad) and
//! 12 (Button).

/// Keyboard/Keypad page (0x07) usages, plus Button page (0x09) usages
/// shifted into the high byte.
pub mod usage {
    // Letters (0x04–0x1D)
    pub const A: u16 = 0x04;
    pub const B: u16 = 0x05;
    pub const C: u16 = 0x06;
    pub const D: u16 = 0x07;
    pub const E: u16 = 0x08;
    pub const F: u16 = 0x09;
    pub const G: u16 = 0x0A;
    pub const H: u16 = 0x0B;
    pub const I: u16 = 0x0C;
    pub const J: u16 = 0x0D;
    pub const K: u16 = 0x0E;
    pub const L: u16 = 0x0F;
    pub const M: u16 = 0x10;
    pub const N: u16 = 0x11;
    pub const O: u16 = 0x12;
    pub const P: u16 = 0x13;
    pub const Q: u16 = 0x14;
    pub const R: u16 = 0x15;
    pub const S: u16 = 0x16;
    pub const T: u16 = 0x17;
    pub const U: u16 = 0x18;
    pub const V: u16 = 0x19;
    pub const W: u16 = 0x1A;
    pub const X: u16 = 0x1B;
    pub const Y: u16 = 0x1C;
    pub const Z: u16 = 0x1D;

    // Digits (0x1E–0x27)
    pub const DIGIT_1: u16 = 0x1E;
    pub const DIGIT_2: u16 = 0x1F;
    pub const DIGIT_3: u16 = 0x20;
    pub const DIGIT_4: u16 = 0x21;
    pub const DIGIT_5: u16 = 0x22;
    pub const DIGIT_6: u16 = 0x23;
    pub const DIGIT_7: u16 = 0x24;
    pub const DIGIT_8: u16 = 0x25;
    pub const DIGIT_9: u16 = 0x26;
    pub const DIGIT_0: u16 = 0x27;

    // Control and punctuation (0x28–0x38)
    pub const ENTER: u16 = 0x28;
    pub const ESCAPE: u16 = 0x29;
    pub const BACKSPACE: u16 = 0x2A;
    pub const TAB: u16 = 0x2B;
    pub const SPACE: u16 = 0x2C;
    pub const MINUS: u16 = 0x2D;
    pub const EQUAL: u16 = 0x2E;
    pub const BRACKET_LEFT: u16 = 0x2F;
    pub const BRACKET_RIGHT: u16 = 0x30;
    pub const BACKSLASH: u16 = 0x31;
    pub const SEMICOLON: u16 = 0x33;
    pub const QUOTE: u16 = 0x34;
    pub const BACKQUOTE: u16 = 0x35;
    pub const COMMA: u16 = 0x36;
    pub const PERIOD: u16 = 0x37;
    pub const SLASH: u16 = 0x38;

    pub const CAPS_LOCK: u16 = 0x39;

    // Function keys (0x3A–0x45)
    pub const F1: u16 = 0x3A;
    pub const F2: u16 = 0x3B;
    pub const F3: u16 = 0x3C;
    pub const F4: u16 = 0x3D;
    pub const F5: u16 = 0x3E;
    pub const F6: u16 = 0x3F;
    pub const F7: u16 = 0x40;
    pub const F8: u16 = 0x41;
    pub const F9: u16 = 0x42;
    pub const F10: u16 = 0x43;
    pub const F11: u16 = 0x44;
    pub const F12: u16 = 0x45;

    // Navigation cluster
    pub const PRINT_SCREEN: u16 = 0x46;
    pub const SCROLL_LOCK: u16 = 0x47;
    pub const PAUSE: u16 = 0x48;
    pub const INSERT: u16 = 0x49;
    pub const HOME: u16 = 0x4A;
    pub const PAGE_UP: u16 = 0x4B;
    pub const DELETE: u16 = 0x4C;
    pub const END: u16 = 0x4D;
    pub const PAGE_DOWN: u16 = 0x4E;
    pub const ARROW_RIGHT: u16 = 0x4F;
    pub const ARROW_LEFT: u16 = 0x50;
    pub const ARROW_DOWN: u16 = 0x51;
    pub const ARROW_UP: u16 = 0x52;

    // Keypad
    pub const NUM_LOCK: u16 = 0x53;
    pub const KEYPAD_DIVIDE: u16 = 0x54;
    pub const KEYPAD_MULTIPLY: u16 = 0x55;
    pub const KEYPAD_SUBTRACT: u16 = 0x56;
    pub const KEYPAD_ADD: u16 = 0x57;
    pub const KEYPAD_ENTER: u16 = 0x58;
    pub const KEYPAD_1: u16 = 0x59;
    pub const KEYPAD_2: u16 = 0x5A;
    pub const KEYPAD_3: u16 = 0x5B;
    pub const KEYPAD_4: u16 = 0x5C;
    pub const KEYPAD_5: u16 = 0x5D;
    pub const KEYPAD_6: u16 = 0x5E;
    pub const KEYPAD_7: u16 = 0x5F;
    pub const KEYPAD_8: u16 = 0x60;
    pub const KEYPAD_9: u16 = 0x61;
    pub const KEYPAD_0: u16 = 0x62;
    pub const KEYPAD_DECIMAL: u16 = 0x63;

    pub const CONTEXT_MENU: u16 = 0x65;

    // Modifiers (0xE0–0xE7)
    pub const CONTROL_LEFT: u16 = 0xE0;
    pub const SHIFT_LEFT: u16 = 0xE1;
    pub const ALT_LEFT: u16 = 0xE2;
    pub const META_LEFT: u16 = 0xE3;
    pub const CONTROL_RIGHT: u16 = 0xE4;
    pub const SHIFT_RIGHT: u16 = 0xE5;
    pub const ALT_RIGHT: u16 = 0xE6;
    pub const META_RIGHT: u16 = 0xE7;

    // Button page (0x09), shifted so it cannot collide with page 0x07.
    // HID orders primary/secondary/tertiary: on a right-handed mouse that is
    // left, right, middle.
    pub const BUTTON_PRIMARY: u16 = 0x0901;
    pub const BUTTON_SECONDARY: u16 = 0x0902;
    pub const BUTTON_TERTIARY: u16 = 0x0903;
    pub const BUTTON_4: u16 = 0x0904;
    pub const BUTTON_5: u16 = 0x0905;
    pub const BUTTON_6: u16 = 0x0906;
    pub const BUTTON_7: u16 = 0x0907;
    pub const BUTTON_8: u16 = 0x0908;
}

/// True when the usage belongs to the Button page (a mouse button).
pub fn is_button_usage(usage: u16) -> bool {
    usage & 0xFF00 == 0x0900
}
