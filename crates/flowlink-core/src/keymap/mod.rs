//! Key code translation tables.
//!
//! Three immutable, build-time tables connect the protocol's key space to
//! the local kernel's:
//!
//! ```text
//! Synergy KeyButton ──synergy──▶ HID usage ──evdev──▶ local evdev code
//! ```
//!
//! The inverses exist for tests. All lookups are pure; "no mapping" is
//! `None` and the caller decides whether to drop or warn.

pub mod evdev;
pub mod hid;
pub mod synergy;

/// Unified mapper over the translation tables.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a protocol KeyButton straight to the local evdev code.
    pub fn key_button_to_evdev(key_button: u16) -> Option<u16> {
        synergy::key_button_to_hid(key_button).and_then(evdev::hid_to_evdev)
    }

    /// Translates a protocol mouse button (1 = left, 2 = middle, 3 = right)
    /// to the local `BTN_*` code, via the synthetic KeyButton encoding.
    pub fn mouse_button_to_evdev(button: u8) -> Option<u16> {
        Self::key_button_to_evdev(synergy::mouse_button_code(button))
    }

    /// Translates a KeyButton to its HID usage.
    pub fn key_button_to_hid(key_button: u16) -> Option<u16> {
        synergy::key_button_to_hid(key_button)
    }

    /// Translates a HID usage to the local evdev code.
    pub fn hid_to_evdev(hid: u16) -> Option<u16> {
        evdev::hid_to_evdev(hid)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::evdev::ecodes;
    use super::*;

    #[test]
    fn test_composition_is_identity_for_linux_scancodes() {
        // The wire carries the Linux scancode set, so the composed map takes
        // a known scancode back to itself.
        for key_button in [1u16, 28, 30, 31, 57, 58, 88, 111] {
            assert_eq!(KeyMapper::key_button_to_evdev(key_button), Some(key_button));
        }
    }

    #[test]
    fn test_mouse_buttons_compose_to_btn_codes() {
        assert_eq!(KeyMapper::mouse_button_to_evdev(1), Some(ecodes::BTN_LEFT));
        assert_eq!(KeyMapper::mouse_button_to_evdev(2), Some(ecodes::BTN_MIDDLE));
        assert_eq!(KeyMapper::mouse_button_to_evdev(3), Some(ecodes::BTN_RIGHT));
        assert_eq!(KeyMapper::mouse_button_to_evdev(4), Some(ecodes::BTN_SIDE));
        assert_eq!(KeyMapper::mouse_button_to_evdev(0), None);
        assert_eq!(KeyMapper::mouse_button_to_evdev(9), None);
    }

    #[test]
    fn test_unmapped_key_button_stays_none_through_composition() {
        assert_eq!(KeyMapper::key_button_to_evdev(0), None);
        assert_eq!(KeyMapper::key_button_to_evdev(0x7F00), None);
    }
}
