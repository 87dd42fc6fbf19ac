//! Platform-agnostic traits over the virtual input devices and the screen
//! probe.
//!
//! The injector only ever talks to these traits; the OS-facing
//! implementations (uinput on Linux, mocks everywhere) live in the
//! infrastructure layer. Events may be buffered by an implementation until
//! [`MouseDevice::syn`]/[`KeyboardDevice::syn`] is called, which demarcates
//! one atomic batch for the kernel.

use thiserror::Error;

use flowlink_core::keymap::evdev::ecodes;

/// Error type for a rejected device write.
///
/// These never cross the dispatcher boundary: the injector logs them at
/// WARN and keeps its press tracking consistent so no phantom press leaks.
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("virtual device rejected event: {0}")]
    Device(String),
}

/// The three Lock modifiers whose state is observable through hardware LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKey {
    CapsLock,
    NumLock,
    ScrollLock,
}

impl LockKey {
    /// The sysfs LED name, as in `/sys/class/leds/inputN::<name>`.
    pub fn led_name(&self) -> &'static str {
        match self {
            LockKey::CapsLock => "capslock",
            LockKey::NumLock => "numlock",
            LockKey::ScrollLock => "scrolllock",
        }
    }

    /// The evdev key that toggles this lock.
    pub fn key_code(&self) -> u16 {
        match self {
            LockKey::CapsLock => ecodes::KEY_CAPSLOCK,
            LockKey::NumLock => ecodes::KEY_NUMLOCK,
            LockKey::ScrollLock => ecodes::KEY_SCROLLLOCK,
        }
    }
}

/// Virtual pointer device.
pub trait MouseDevice: Send + Sync {
    /// Moves the cursor to an absolute position.
    fn move_absolute(&mut self, x: i32, y: i32) -> Result<(), InjectError>;

    /// Moves the cursor by a relative delta.
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InjectError>;

    /// Emits wheel clicks: `dy` vertical, `dx` horizontal, signed.
    fn wheel(&mut self, dy: i32, dx: i32) -> Result<(), InjectError>;

    /// Presses or releases a `BTN_*` code.
    fn button(&mut self, code: u16, down: bool) -> Result<(), InjectError>;

    /// Flushes buffered events as one atomic packet.
    fn syn(&mut self);

    /// Destroys the virtual device.
    fn close(&mut self);
}

/// Virtual keyboard device.
pub trait KeyboardDevice: Send + Sync {
    /// Presses or releases a `KEY_*` code.
    fn key(&mut self, code: u16, down: bool) -> Result<(), InjectError>;

    /// Reads the *system's* current Lock state. On Linux this goes through
    /// sysfs LEDs, not through the virtual device: uinput cannot answer the
    /// query and the EVIOCGLED ioctl can block on wedged devices.
    fn lock_state(&self, lock: LockKey) -> bool;

    /// Flushes buffered events as one atomic packet.
    fn syn(&mut self);

    /// Destroys the virtual device.
    fn close(&mut self);
}

/// Read-only view of the local screen, delegated to a platform probe.
pub trait ScreenProbe: Send + Sync {
    /// The screen size in pixels, if the platform can report it.
    fn screen_size(&self) -> Option<(u16, u16)>;

    /// The real OS cursor position, used to reconcile the logical cursor.
    fn cursor_position(&self) -> Option<(i32, i32)>;
}
