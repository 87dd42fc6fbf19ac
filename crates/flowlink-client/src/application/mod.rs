//! Application layer: the message-driven logic between the wire and the
//! virtual devices.

pub mod cursor;
pub mod device;
pub mod dispatcher;
pub mod injector;
pub mod state;

pub use cursor::CursorContext;
pub use device::{InjectError, KeyboardDevice, LockKey, MouseDevice, ScreenProbe};
pub use dispatcher::{dispatch_channel, ReplySink, Worker, QUEUE_CAPACITY};
pub use injector::{InjectorSettings, InputInjector};
pub use state::{SessionState, StateHandle};
