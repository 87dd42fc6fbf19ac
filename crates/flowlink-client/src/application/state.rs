//! Session state machine shared between the session and the injector.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Connection lifecycle states.
///
/// Transitions are driven by control messages and I/O events:
/// `Connected → Active` on `CINN`, `Active → Connected` on `COUT`, any state
/// to `Disconnected` on `CBYE`, a protocol error, or a socket error.
/// `Inactive` is reserved and currently unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Disconnected = 0,
    Connecting = 1,
    Handshake = 2,
    Connected = 3,
    Active = 4,
    Inactive = 5,
}

impl SessionState {
    fn from_u8(v: u8) -> SessionState {
        match v {
            1 => SessionState::Connecting,
            2 => SessionState::Handshake,
            3 => SessionState::Connected,
            4 => SessionState::Active,
            5 => SessionState::Inactive,
            _ => SessionState::Disconnected,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Handshake => "handshake",
            SessionState::Connected => "connected",
            SessionState::Active => "active",
            SessionState::Inactive => "inactive",
        };
        f.write_str(s)
    }
}

/// Cheap shared handle to the session state.
///
/// The read loop and the dispatcher worker both observe it; only control
/// handlers mutate it, so a relaxed atomic is sufficient.
#[derive(Clone, Default)]
pub struct StateHandle {
    inner: Arc<AtomicU8>,
}

impl StateHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.inner.load(Ordering::Relaxed))
    }

    pub fn set(&self, state: SessionState) {
        self.inner.store(state as u8, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.get() == SessionState::Active
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_handle_starts_disconnected() {
        let state = StateHandle::new();
        assert_eq!(state.get(), SessionState::Disconnected);
        assert!(!state.is_active());
    }

    #[test]
    fn test_state_transitions_are_visible_through_clones() {
        let state = StateHandle::new();
        let observer = state.clone();

        state.set(SessionState::Active);
        assert!(observer.is_active());

        state.set(SessionState::Connected);
        assert_eq!(observer.get(), SessionState::Connected);
    }
}
