//! Linux uinput virtual devices.
//!
//! Creates one virtual mouse and one virtual keyboard through
//! `/dev/uinput` (requires membership in the `input`/`uinput` group or an
//! appropriate udev rule). Writes are buffered per device and flushed by
//! `syn()`, so every flush reaches the kernel as one atomic event packet
//! terminated by `SYN_REPORT`.
//!
//! Lock (Caps/Num/Scroll) state is intentionally *not* queried through
//! uinput: the virtual device has no authoritative LED state and the ioctl
//! path can block on wedged devices. The system state is read from
//! `/sys/class/leds/*::capslock` (and friends) instead.

#![cfg(target_os = "linux")]

use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, EventType, InputEvent, Key, RelativeAxisType,
    UinputAbsSetup,
};
use tracing::warn;

use flowlink_core::keymap::evdev::ecodes;

use crate::application::device::{InjectError, KeyboardDevice, LockKey, MouseDevice};

fn dev_err(e: std::io::Error) -> InjectError {
    InjectError::Device(e.to_string())
}

// ── Mouse ─────────────────────────────────────────────────────────────────────

pub struct UinputMouse {
    device: Option<VirtualDevice>,
    pending: Vec<InputEvent>,
}

impl UinputMouse {
    /// Creates the virtual pointer. `screen` bounds the absolute axes.
    pub fn new(screen: (u16, u16)) -> Result<Self, InjectError> {
        let mut buttons = AttributeSet::<Key>::new();
        for code in [
            ecodes::BTN_LEFT,
            ecodes::BTN_RIGHT,
            ecodes::BTN_MIDDLE,
            ecodes::BTN_SIDE,
            ecodes::BTN_EXTRA,
            ecodes::BTN_FORWARD,
            ecodes::BTN_BACK,
            ecodes::BTN_TASK,
        ] {
            buttons.insert(Key::new(code));
        }

        let mut rel = AttributeSet::<RelativeAxisType>::new();
        rel.insert(RelativeAxisType::REL_X);
        rel.insert(RelativeAxisType::REL_Y);
        rel.insert(RelativeAxisType::REL_WHEEL);
        rel.insert(RelativeAxisType::REL_HWHEEL);

        let abs_x = UinputAbsSetup::new(
            AbsoluteAxisType::ABS_X,
            AbsInfo::new(0, 0, screen.0 as i32, 0, 0, 0),
        );
        let abs_y = UinputAbsSetup::new(
            AbsoluteAxisType::ABS_Y,
            AbsInfo::new(0, 0, screen.1 as i32, 0, 0, 0),
        );

        let device = VirtualDeviceBuilder::new()
            .map_err(dev_err)?
            .name("Flowlink Virtual Mouse")
            .with_keys(&buttons)
            .map_err(dev_err)?
            .with_relative_axes(&rel)
            .map_err(dev_err)?
            .with_absolute_axis(&abs_x)
            .map_err(dev_err)?
            .with_absolute_axis(&abs_y)
            .map_err(dev_err)?
            .build()
            .map_err(dev_err)?;

        Ok(Self {
            device: Some(device),
            pending: Vec::new(),
        })
    }

    fn queue(&mut self, event: InputEvent) -> Result<(), InjectError> {
        if self.device.is_none() {
            return Err(InjectError::Device("mouse device closed".into()));
        }
        self.pending.push(event);
        Ok(())
    }
}

impl MouseDevice for UinputMouse {
    fn move_absolute(&mut self, x: i32, y: i32) -> Result<(), InjectError> {
        self.queue(InputEvent::new(
            EventType::ABSOLUTE,
            AbsoluteAxisType::ABS_X.0,
            x,
        ))?;
        self.queue(InputEvent::new(
            EventType::ABSOLUTE,
            AbsoluteAxisType::ABS_Y.0,
            y,
        ))
    }

    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<(), InjectError> {
        self.queue(InputEvent::new(
            EventType::RELATIVE,
            RelativeAxisType::REL_X.0,
            dx,
        ))?;
        self.queue(InputEvent::new(
            EventType::RELATIVE,
            RelativeAxisType::REL_Y.0,
            dy,
        ))
    }

    fn wheel(&mut self, dy: i32, dx: i32) -> Result<(), InjectError> {
        if dy != 0 {
            self.queue(InputEvent::new(
                EventType::RELATIVE,
                RelativeAxisType::REL_WHEEL.0,
                dy,
            ))?;
        }
        if dx != 0 {
            self.queue(InputEvent::new(
                EventType::RELATIVE,
                RelativeAxisType::REL_HWHEEL.0,
                dx,
            ))?;
        }
        Ok(())
    }

    fn button(&mut self, code: u16, down: bool) -> Result<(), InjectError> {
        self.queue(InputEvent::new(EventType::KEY, code, down as i32))
    }

    fn syn(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if let Some(device) = self.device.as_mut() {
            // emit() appends the SYN_REPORT that closes the packet.
            if let Err(e) = device.emit(&self.pending) {
                warn!(error = %e, "uinput mouse emit failed");
            }
        }
        self.pending.clear();
    }

    fn close(&mut self) {
        self.pending.clear();
        self.device = None;
    }
}

// ── Keyboard ──────────────────────────────────────────────────────────────────

pub struct UinputKeyboard {
    device: Option<VirtualDevice>,
    pending: Vec<InputEvent>,
}

impl UinputKeyboard {
    pub fn new() -> Result<Self, InjectError> {
        let mut keys = AttributeSet::<Key>::new();
        // The whole keyboard range; the keymap decides what we actually send.
        for code in 1..=255u16 {
            keys.insert(Key::new(code));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(dev_err)?
            .name("Flowlink Virtual Keyboard")
            .with_keys(&keys)
            .map_err(dev_err)?
            .build()
            .map_err(dev_err)?;

        Ok(Self {
            device: Some(device),
            pending: Vec::new(),
        })
    }
}

impl KeyboardDevice for UinputKeyboard {
    fn key(&mut self, code: u16, down: bool) -> Result<(), InjectError> {
        if self.device.is_none() {
            return Err(InjectError::Device("keyboard device closed".into()));
        }
        self.pending
            .push(InputEvent::new(EventType::KEY, code, down as i32));
        Ok(())
    }

    fn lock_state(&self, lock: LockKey) -> bool {
        read_lock_led(lock.led_name())
    }

    fn syn(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if let Some(device) = self.device.as_mut() {
            if let Err(e) = device.emit(&self.pending) {
                warn!(error = %e, "uinput keyboard emit failed");
            }
        }
        self.pending.clear();
    }

    fn close(&mut self) {
        self.pending.clear();
        self.device = None;
    }
}

// ── Lock LED state via sysfs ──────────────────────────────────────────────────

/// True when any LED registered for `name` (e.g. `input3::capslock`) has a
/// non-zero brightness.
pub fn read_lock_led(name: &str) -> bool {
    let suffix = format!("::{name}");
    let Ok(entries) = std::fs::read_dir("/sys/class/leds") else {
        return false;
    };
    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().ends_with(&suffix) {
            continue;
        }
        match std::fs::read_to_string(entry.path().join("brightness")) {
            Ok(content) => {
                if content.trim() != "0" {
                    return true;
                }
            }
            Err(e) => warn!(led = %entry.file_name().to_string_lossy(), error = %e, "LED read failed"),
        }
    }
    false
}
