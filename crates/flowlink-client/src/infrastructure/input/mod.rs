//! Virtual-device backends and screen probes.
//!
//! The uinput backend is Linux-only and compiled per `target_os`. The mock
//! devices are always compiled: tests on any platform drive the injector
//! against them and inspect the recorded event stream.

pub mod screen;

#[cfg(target_os = "linux")]
pub mod uinput;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::application::device::{
    InjectError, KeyboardDevice, LockKey, MouseDevice, ScreenProbe,
};

// ── Recording mocks ───────────────────────────────────────────────────────────

/// One event as a mock device observed it, in global emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    MouseAbsolute { x: i32, y: i32 },
    MouseRelative { dx: i32, dy: i32 },
    Wheel { dy: i32, dx: i32 },
    Button { code: u16, down: bool },
    Key { code: u16, down: bool },
    MouseSyn,
    KeyboardSyn,
    MouseClosed,
    KeyboardClosed,
}

/// Shared log both mock devices append to, so tests can assert ordering
/// across the mouse/keyboard boundary.
pub type EventLog = Arc<Mutex<Vec<RecordedEvent>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Mock pointer recording every call.
pub struct MockMouse {
    log: EventLog,
    /// When set, every write is rejected (exercises the error path).
    pub fail_writes: bool,
}

impl MockMouse {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            fail_writes: false,
        }
    }

    fn push(&self, event: RecordedEvent) -> Result<(), InjectError> {
        if self.fail_writes {
            return Err(InjectError::Device("mock mouse write failure".into()));
        }
        self.log.lock().unwrap().push(event);
        Ok(())
    }
}

impl MouseDevice for MockMouse {
    fn move_absolute(&mut self, x: i32, y: i32) -> Result<(), InjectError> {
        self.push(RecordedEvent::MouseAbsolute { x, y })
    }

    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InjectError> {
        self.push(RecordedEvent::MouseRelative { dx, dy })
    }

    fn wheel(&mut self, dy: i32, dx: i32) -> Result<(), InjectError> {
        self.push(RecordedEvent::Wheel { dy, dx })
    }

    fn button(&mut self, code: u16, down: bool) -> Result<(), InjectError> {
        self.push(RecordedEvent::Button { code, down })
    }

    fn syn(&mut self) {
        self.log.lock().unwrap().push(RecordedEvent::MouseSyn);
    }

    fn close(&mut self) {
        self.log.lock().unwrap().push(RecordedEvent::MouseClosed);
    }
}

/// Mock keyboard recording every call, with settable Lock LED state.
pub struct MockKeyboard {
    log: EventLog,
    leds: Arc<Mutex<HashMap<LockKey, bool>>>,
    pub fail_writes: bool,
}

impl MockKeyboard {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            leds: Arc::new(Mutex::new(HashMap::new())),
            fail_writes: false,
        }
    }

    /// Handle the test keeps to flip LED state mid-test.
    pub fn leds(&self) -> Arc<Mutex<HashMap<LockKey, bool>>> {
        Arc::clone(&self.leds)
    }
}

impl KeyboardDevice for MockKeyboard {
    fn key(&mut self, code: u16, down: bool) -> Result<(), InjectError> {
        if self.fail_writes {
            return Err(InjectError::Device("mock keyboard write failure".into()));
        }
        self.log
            .lock()
            .unwrap()
            .push(RecordedEvent::Key { code, down });
        Ok(())
    }

    fn lock_state(&self, lock: LockKey) -> bool {
        self.leds.lock().unwrap().get(&lock).copied().unwrap_or(false)
    }

    fn syn(&mut self) {
        self.log.lock().unwrap().push(RecordedEvent::KeyboardSyn);
    }

    fn close(&mut self) {
        self.log.lock().unwrap().push(RecordedEvent::KeyboardClosed);
    }
}

/// Screen probe with fixed answers.
pub struct MockScreenProbe {
    pub size: Option<(u16, u16)>,
    pub cursor: Option<(i32, i32)>,
}

impl MockScreenProbe {
    pub fn sized(width: u16, height: u16) -> Self {
        Self {
            size: Some((width, height)),
            cursor: None,
        }
    }

    pub fn blind() -> Self {
        Self {
            size: None,
            cursor: None,
        }
    }
}

impl ScreenProbe for MockScreenProbe {
    fn screen_size(&self) -> Option<(u16, u16)> {
        self.size
    }

    fn cursor_position(&self) -> Option<(i32, i32)> {
        self.cursor
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
