//! The input injector: applies decoded messages to the local system.
//!
//! This is the state-bearing heart of the client. It owns the two virtual
//! devices, the cursor model, the pressed-key/button sets, and the modifier
//! bitmask, and it runs entirely on the dispatcher's consumer task.
//!
//! Two invariants matter most:
//!
//! - every code in a pressed set has had a down event emitted and no up
//!   event yet; on screen-leave or shutdown both sets are drained with
//!   explicit up events so no key is left stuck on this machine;
//! - releases are keyed on the protocol KeyButton's translation, never on
//!   KeyID, so dead keys and layout switches cannot desynchronise the sets.
//!
//! Device failures are logged and swallowed here; a handler must never
//! crash the worker. Press tracking is updated even when the write fails,
//! otherwise a failed down would leave a phantom press to "release" later.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use flowlink_core::keymap::evdev::ecodes;
use flowlink_core::protocol::messages::{modifier, EnterMsg, Message, ScreenInfoMsg};
use flowlink_core::KeyMapper;

use super::cursor::CursorContext;
use super::device::{KeyboardDevice, LockKey, MouseDevice};
use super::state::{SessionState, StateHandle};

/// Tunables read from configuration at startup.
#[derive(Debug, Clone)]
pub struct InjectorSettings {
    /// When true, every accepted `DMMV` is an absolute move. When false,
    /// moves are relative with periodic absolute reseeds.
    pub abs_mouse_move: bool,
    /// Minimum wall-clock interval between emitted moves; faster `DMMV`
    /// traffic is dropped.
    pub move_threshold: Duration,
    /// Every Nth accepted move is emitted absolutely and reseeds the
    /// logical cursor, bounding relative-move drift.
    pub sync_freq: u32,
}

impl Default for InjectorSettings {
    fn default() -> Self {
        Self {
            abs_mouse_move: false,
            move_threshold: Duration::from_millis(8),
            sync_freq: 2,
        }
    }
}

/// Non-Lock modifiers, paired with the key used to assert them locally.
/// Super shares Left Meta with Meta; Level5Lock rides on Right Ctrl.
const PLAIN_MODIFIERS: [(u16, u16); 7] = [
    (modifier::SHIFT, ecodes::KEY_LEFTSHIFT),
    (modifier::CONTROL, ecodes::KEY_LEFTCTRL),
    (modifier::ALT, ecodes::KEY_LEFTALT),
    (modifier::ALT_GR, ecodes::KEY_RIGHTALT),
    (modifier::META, ecodes::KEY_LEFTMETA),
    (modifier::SUPER, ecodes::KEY_LEFTMETA),
    (modifier::LEVEL5_LOCK, ecodes::KEY_RIGHTCTRL),
];

const LOCKS: [(LockKey, u16); 3] = [
    (LockKey::CapsLock, modifier::CAPS_LOCK),
    (LockKey::NumLock, modifier::NUM_LOCK),
    (LockKey::ScrollLock, modifier::SCROLL_LOCK),
];

/// Translates remote input events into local kernel input events.
pub struct InputInjector {
    mouse: Box<dyn MouseDevice>,
    keyboard: Box<dyn KeyboardDevice>,
    cursor: CursorContext,
    state: StateHandle,
    settings: InjectorSettings,

    pressed_keys: HashSet<u16>,
    pressed_buttons: HashSet<u16>,
    current_modifiers: u16,

    move_count: u32,
    last_move: Option<Instant>,
}

impl InputInjector {
    pub fn new(
        mouse: Box<dyn MouseDevice>,
        keyboard: Box<dyn KeyboardDevice>,
        cursor: CursorContext,
        state: StateHandle,
        settings: InjectorSettings,
    ) -> Self {
        Self {
            mouse,
            keyboard,
            cursor,
            state,
            settings,
            pressed_keys: HashSet::new(),
            pressed_buttons: HashSet::new(),
            current_modifiers: 0,
            move_count: 0,
            last_move: None,
        }
    }

    // ── Control handlers ──────────────────────────────────────────────────────

    /// `CINN`: the cursor entered this screen.
    pub fn enter(&mut self, msg: &EnterMsg) {
        info!(x = msg.entry_x, y = msg.entry_y, "entered screen");
        if let Err(e) = self
            .mouse
            .move_absolute(msg.entry_x as i32, msg.entry_y as i32)
        {
            warn!(error = %e, "entry cursor warp failed");
        }
        self.cursor.set_logical(msg.entry_x as i32, msg.entry_y as i32);
        self.sync_modifiers(msg.mod_mask);
        self.state.set(SessionState::Active);
        self.flush();
    }

    /// `COUT`: the cursor left this screen. Everything still pressed is
    /// released before the state changes.
    pub fn leave(&mut self) {
        info!("left screen");
        self.release_all();
        self.state.set(SessionState::Connected);
        self.flush();
    }

    // ── Keyboard handlers ─────────────────────────────────────────────────────

    pub fn key_down(&mut self, key_button: u16) {
        if !self.gate("DKDN") {
            return;
        }
        let Some(code) = KeyMapper::key_button_to_evdev(key_button) else {
            warn!(key_button, "no local mapping for key, dropping");
            return;
        };
        self.emit_key(code, true);
        self.flush();
    }

    /// `DKRP`: a fresh down only if the key is not already pressed;
    /// otherwise the OS's own auto-repeat is already running.
    pub fn key_repeat(&mut self, key_button: u16) {
        if !self.gate("DKRP") {
            return;
        }
        let Some(code) = KeyMapper::key_button_to_evdev(key_button) else {
            warn!(key_button, "no local mapping for key, dropping");
            return;
        };
        if !self.pressed_keys.contains(&code) {
            self.emit_key(code, true);
            self.flush();
        }
    }

    pub fn key_up(&mut self, key_button: u16) {
        if !self.gate("DKUP") {
            return;
        }
        let Some(code) = KeyMapper::key_button_to_evdev(key_button) else {
            warn!(key_button, "no local mapping for key, dropping");
            return;
        };
        self.emit_key(code, false);
        self.flush();
    }

    // ── Mouse handlers ────────────────────────────────────────────────────────

    pub fn mouse_down(&mut self, button: u8) {
        if !self.gate("DMDN") {
            return;
        }
        let Some(code) = KeyMapper::mouse_button_to_evdev(button) else {
            warn!(button, "no local mapping for mouse button, dropping");
            return;
        };
        self.emit_button(code, true);
        self.flush();
    }

    pub fn mouse_up(&mut self, button: u8) {
        if !self.gate("DMUP") {
            return;
        }
        let Some(code) = KeyMapper::mouse_button_to_evdev(button) else {
            warn!(button, "no local mapping for mouse button, dropping");
            return;
        };
        self.emit_button(code, false);
        self.flush();
    }

    /// `DMMV`: absolute target position from the server.
    ///
    /// The throttle filters first; only accepted events advance the reseed
    /// counter. Relative mode keeps local acceleration curves working while
    /// the periodic absolute reseed bounds the accumulated drift.
    pub fn mouse_move(&mut self, x: i16, y: i16) {
        if !self.gate("DMMV") {
            return;
        }
        let now = Instant::now();
        if let Some(last) = self.last_move {
            if now.duration_since(last) < self.settings.move_threshold {
                return;
            }
        }
        self.last_move = Some(now);

        if self.settings.abs_mouse_move {
            if let Err(e) = self.mouse.move_absolute(x as i32, y as i32) {
                warn!(error = %e, "absolute move failed");
            }
            self.cursor.set_logical(x as i32, y as i32);
            self.flush();
            return;
        }

        self.move_count += 1;
        if self.move_count >= self.settings.sync_freq {
            self.move_count = 0;
            if let Err(e) = self.mouse.move_absolute(x as i32, y as i32) {
                warn!(error = %e, "reseed move failed");
            }
            self.cursor.set_logical(x as i32, y as i32);
        } else {
            let (dx, dy) = self.cursor.relative_move_to(x as i32, y as i32);
            if dx != 0 || dy != 0 {
                if let Err(e) = self.mouse.move_relative(dx, dy) {
                    warn!(error = %e, "relative move failed");
                }
            }
        }
        self.flush();
    }

    /// `DMRM`: the server's relative deltas pass through unchanged.
    pub fn mouse_rel_move(&mut self, dx: i16, dy: i16) {
        if !self.gate("DMRM") {
            return;
        }
        if dx != 0 || dy != 0 {
            if let Err(e) = self.mouse.move_relative(dx as i32, dy as i32) {
                warn!(error = %e, "relative move failed");
            }
            self.flush();
        }
    }

    /// `DMWM`: one wheel click per non-zero axis, in the sign's direction.
    /// The ±120-per-tick magnitude is intentionally quantised away.
    pub fn mouse_wheel(&mut self, x_delta: i16, y_delta: i16) {
        if !self.gate("DMWM") {
            return;
        }
        let dy = y_delta.signum() as i32;
        let dx = x_delta.signum() as i32;
        if dy != 0 || dx != 0 {
            if let Err(e) = self.mouse.wheel(dy, dx) {
                warn!(error = %e, "wheel failed");
            }
            self.flush();
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Builds the `DINF` reply for `QINF`: refreshed geometry, reconciled
    /// logical cursor, `(left, top)` and the obsolete warp zone fixed at 0.
    pub fn screen_info(&mut self) -> Message {
        self.cursor.update_screen_info();
        self.cursor.sync_logical_to_real();
        let (width, height) = self.cursor.screen_size();
        let (mx, my) = self.cursor.logical();
        Message::ScreenInfo(ScreenInfoMsg {
            left: 0,
            top: 0,
            width,
            height,
            warp_zone: 0,
            mouse_x: mx as i16,
            mouse_y: my as i16,
        })
    }

    // ── Modifier synchronisation ──────────────────────────────────────────────

    /// Aligns local toggle/modifier state with the server's mask.
    ///
    /// Lock keys are compared against the physical LED state and tapped
    /// (down, up) when they disagree. Plain modifiers are pressed or
    /// released according to `current ^ target`.
    pub fn sync_modifiers(&mut self, target: u16) {
        for (lock, bit) in LOCKS {
            let want = target & bit != 0;
            let have = self.keyboard.lock_state(lock);
            if want != have {
                debug!(
                    led = lock.led_name(),
                    remote = want,
                    local = have,
                    "lock state differs, tapping key"
                );
                self.emit_key(lock.key_code(), true);
                self.emit_key(lock.key_code(), false);
            }
        }

        let changed = self.current_modifiers ^ target;
        if changed != 0 {
            for (bit, code) in PLAIN_MODIFIERS {
                if changed & bit != 0 {
                    let down = target & bit != 0;
                    debug!(mask = bit, code, down, "modifier change");
                    self.emit_key(code, down);
                }
            }
        }
        self.current_modifiers = target;
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────

    /// Releases everything still pressed and destroys the virtual devices.
    /// Called by the worker when the queue closes, on any exit path.
    pub fn shutdown(&mut self) {
        if !self.pressed_keys.is_empty() || !self.pressed_buttons.is_empty() {
            self.release_all();
            self.flush();
        }
        self.mouse.close();
        self.keyboard.close();
    }

    // ── Introspection (tests and DINF) ────────────────────────────────────────

    pub fn pressed_keys(&self) -> &HashSet<u16> {
        &self.pressed_keys
    }

    pub fn pressed_buttons(&self) -> &HashSet<u16> {
        &self.pressed_buttons
    }

    pub fn current_modifiers(&self) -> u16 {
        self.current_modifiers
    }

    pub fn logical_cursor(&self) -> (i32, i32) {
        self.cursor.logical()
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn gate(&self, code: &str) -> bool {
        if self.state.is_active() {
            return true;
        }
        warn!(code, state = %self.state.get(), "ignoring message outside active state");
        false
    }

    fn emit_key(&mut self, code: u16, down: bool) {
        if down {
            self.pressed_keys.insert(code);
        } else {
            self.pressed_keys.remove(&code);
        }
        if let Err(e) = self.keyboard.key(code, down) {
            warn!(code, down, error = %e, "keyboard write failed");
        }
    }

    fn emit_button(&mut self, code: u16, down: bool) {
        if down {
            self.pressed_buttons.insert(code);
        } else {
            self.pressed_buttons.remove(&code);
        }
        if let Err(e) = self.mouse.button(code, down) {
            warn!(code, down, error = %e, "mouse write failed");
        }
    }

    fn release_all(&mut self) {
        for code in std::mem::take(&mut self.pressed_buttons) {
            if let Err(e) = self.mouse.button(code, false) {
                warn!(code, error = %e, "release write failed");
            }
        }
        for code in std::mem::take(&mut self.pressed_keys) {
            if let Err(e) = self.keyboard.key(code, false) {
                warn!(code, error = %e, "release write failed");
            }
        }
    }

    fn flush(&mut self) {
        self.mouse.syn();
        self.keyboard.syn();
    }
}
