//! Wayland screen probe.
//!
//! There is no portable Wayland protocol for "what is the screen size" or
//! "where is the cursor" that an ordinary client may use, so this probe
//! shells out to the compositors' own tools in order of likelihood:
//! `wlr-randr` (wlroots), `hyprctl` (Hyprland), and `qdbus` against KWin
//! for the cursor. `SCREEN_WIDTH`/`SCREEN_HEIGHT` act as a manual override
//! of last resort; total failure is `None` and the caller falls back to
//! 1920×1080.

use std::process::Command;

use tracing::{debug, warn};

use crate::application::device::ScreenProbe;

pub struct WaylandScreenProbe;

impl WaylandScreenProbe {
    pub fn new() -> Self {
        Self
    }

    fn from_wlr_randr() -> Option<(u16, u16)> {
        let output = Command::new("wlr-randr").output().ok()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            if !line.contains("current") {
                continue;
            }
            for token in line.split_whitespace() {
                if let Some(size) = parse_resolution(token) {
                    debug!(width = size.0, height = size.1, "screen size via wlr-randr");
                    return Some(size);
                }
            }
        }
        None
    }

    fn from_hyprctl() -> Option<(u16, u16)> {
        let output = Command::new("hyprctl").arg("monitors").output().ok()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            for token in line.split_whitespace() {
                // Monitor lines read like "2560x1440@144.0 at 0x0"; take the
                // part before the refresh rate.
                let resolution = token.split('@').next().unwrap_or(token);
                if let Some(size) = parse_resolution(resolution) {
                    debug!(width = size.0, height = size.1, "screen size via hyprctl");
                    return Some(size);
                }
            }
        }
        None
    }

    fn from_env() -> Option<(u16, u16)> {
        let width = std::env::var("SCREEN_WIDTH").ok()?.parse().ok()?;
        let height = std::env::var("SCREEN_HEIGHT").ok()?.parse().ok()?;
        Some((width, height))
    }

    fn cursor_from_hyprctl() -> Option<(i32, i32)> {
        let output = Command::new("hyprctl").arg("cursorpos").output().ok()?;
        if !output.status.success() {
            return None;
        }
        // Output is "x, y".
        let text = String::from_utf8_lossy(&output.stdout);
        let mut parts = text.trim().split(',');
        let x = parts.next()?.trim().parse().ok()?;
        let y = parts.next()?.trim().parse().ok()?;
        Some((x, y))
    }

    fn cursor_from_kwin() -> Option<(i32, i32)> {
        let output = Command::new("qdbus")
            .args(["org.kde.KWin", "/KWin", "org.kde.KWin.cursorPos"])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        // Output is "QPoint(x, y)" or "x,y" depending on the qdbus flavour.
        let text = String::from_utf8_lossy(&output.stdout);
        let cleaned = text.trim().replace("QPoint(", "").replace(')', "");
        let mut parts = cleaned.split(',');
        let x = parts.next()?.trim().parse().ok()?;
        let y = parts.next()?.trim().parse().ok()?;
        Some((x, y))
    }
}

impl Default for WaylandScreenProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenProbe for WaylandScreenProbe {
    fn screen_size(&self) -> Option<(u16, u16)> {
        Self::from_wlr_randr()
            .or_else(Self::from_hyprctl)
            .or_else(Self::from_env)
            .or_else(|| {
                warn!("no compositor tool answered, screen size unknown");
                None
            })
    }

    fn cursor_position(&self) -> Option<(i32, i32)> {
        Self::cursor_from_hyprctl().or_else(Self::cursor_from_kwin)
    }
}

/// Parses "1920x1080" into a pair; rejects anything else.
fn parse_resolution(token: &str) -> Option<(u16, u16)> {
    let (w, h) = token.split_once('x')?;
    let width: u16 = w.parse().ok()?;
    let height: u16 = h.parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
