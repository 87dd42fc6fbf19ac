//! The injector's cursor model.
//!
//! The logical position is our estimate of where the OS cursor is. Every
//! emitted move updates it; relative deltas are computed against it; and it
//! is periodically reconciled with the real OS cursor because relative moves
//! pass through local acceleration curves and accumulate error.

use tracing::{debug, warn};

use super::device::ScreenProbe;

/// Fallback geometry when the platform probe cannot answer.
pub const FALLBACK_SCREEN: (u16, u16) = (1920, 1080);

/// Screen geometry plus the logical cursor estimate.
pub struct CursorContext {
    probe: Box<dyn ScreenProbe>,
    /// Fixed geometry from configuration; when set, the probe is never asked
    /// for the size.
    configured_size: Option<(u16, u16)>,
    screen: (u16, u16),
    logical: (i32, i32),
}

impl CursorContext {
    pub fn new(probe: Box<dyn ScreenProbe>, configured_size: Option<(u16, u16)>) -> Self {
        let mut ctx = Self {
            probe,
            configured_size,
            screen: FALLBACK_SCREEN,
            logical: (0, 0),
        };
        ctx.update_screen_info();
        ctx
    }

    /// Re-reads the screen geometry (configuration first, then the platform
    /// probe, then the fallback).
    pub fn update_screen_info(&mut self) {
        if let Some(size) = self.configured_size {
            self.screen = size;
            return;
        }
        match self.probe.screen_size() {
            Some(size) => {
                debug!(width = size.0, height = size.1, "probed screen size");
                self.screen = size;
            }
            None => {
                warn!(
                    width = FALLBACK_SCREEN.0,
                    height = FALLBACK_SCREEN.1,
                    "screen probe failed, using fallback size"
                );
                self.screen = FALLBACK_SCREEN;
            }
        }
    }

    pub fn screen_size(&self) -> (u16, u16) {
        self.screen
    }

    pub fn logical(&self) -> (i32, i32) {
        self.logical
    }

    pub fn set_logical(&mut self, x: i32, y: i32) {
        self.logical = (x, y);
    }

    /// Replaces the logical estimate with the real OS cursor position, when
    /// the probe can report one. Bounds the drift accumulated by relative
    /// moves.
    pub fn sync_logical_to_real(&mut self) {
        if let Some(real) = self.probe.cursor_position() {
            self.logical = real;
        }
    }

    /// Converts a target absolute position into the relative delta from the
    /// current logical position, clamping the target to the screen and
    /// advancing the logical cursor to it.
    pub fn relative_move_to(&mut self, target_x: i32, target_y: i32) -> (i32, i32) {
        let clamped_x = target_x.clamp(0, self.screen.0 as i32);
        let clamped_y = target_y.clamp(0, self.screen.1 as i32);
        let dx = clamped_x - self.logical.0;
        let dy = clamped_y - self.logical.1;
        self.logical = (clamped_x, clamped_y);
        (dx, dy)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
