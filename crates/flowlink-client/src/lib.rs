//! flowlink-client library entry point.
//!
//! Re-exports the module tree so that the integration tests in `tests/` and
//! the binary in `main.rs` share the same code.
//!
//! The client is the *secondary* screen of a Barrier/Synergy/Deskflow pair:
//! a server on another machine owns the physical keyboard and mouse, and
//! when its cursor crosses onto this screen's virtual position the server
//! streams input events here. The client decodes them and replays them
//! through virtual kernel devices as if real hardware had produced them.
//!
//! ```text
//! socket ─▶ StreamParser ─▶ codec ─▶ dispatcher queue ─▶ InputInjector ─▶ uinput
//! ```

/// Application layer: injector, dispatcher, cursor model, device traits.
pub mod application;

/// Infrastructure layer: session, TLS, trust store, config, device backends.
pub mod infrastructure;
