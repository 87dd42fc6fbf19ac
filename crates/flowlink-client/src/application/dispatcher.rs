//! The dispatcher: a bounded FIFO between the socket read loop and the
//! injector.
//!
//! The read loop is the sole producer and [`Worker::run`] the sole consumer,
//! so messages reach the injector strictly in arrival order — the property
//! that keeps the pressed sets consistent (a `DKUP` overtaking its `DKDN`
//! would desynchronise them). When the queue is full the producer's
//! `send().await` parks, which pauses the socket reads and lets TCP
//! back-pressure propagate to the server; nothing is dropped under load.
//!
//! The handler registry of the original dynamic design is the `match` in
//! [`Worker::dispatch`]: one arm per known code, a default arm that logs
//! and drops unknown ones.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use flowlink_core::Message;

use super::injector::InputInjector;

/// Capacity of the dispatch queue, in messages.
pub const QUEUE_CAPACITY: usize = 100;

/// Creates the producer/consumer pair for the dispatch queue.
pub fn dispatch_channel() -> (mpsc::Sender<Message>, mpsc::Receiver<Message>) {
    mpsc::channel(QUEUE_CAPACITY)
}

/// Outbound half the worker needs: replies (`DINF`) and shutdown.
///
/// Implemented by the session's writer handle; tests substitute a recorder.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Encodes and writes one message to the server.
    async fn send(&self, msg: &Message);

    /// Closes the writer, which EOFs the read loop and ends the session.
    async fn shutdown(&self);
}

/// The single consumer draining the dispatch queue into the injector.
pub struct Worker<S: ReplySink> {
    rx: mpsc::Receiver<Message>,
    injector: InputInjector,
    outbound: S,
    running: Arc<AtomicBool>,
}

impl<S: ReplySink> Worker<S> {
    pub fn new(
        rx: mpsc::Receiver<Message>,
        injector: InputInjector,
        outbound: S,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            rx,
            injector,
            outbound,
            running,
        }
    }

    /// Drains the queue until it closes or a shutdown is initiated, then
    /// releases all outstanding presses and destroys the virtual devices.
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            self.dispatch(msg).await;
            if !self.running.load(Ordering::Relaxed) {
                break;
            }
        }
        self.injector.shutdown();
        debug!("dispatcher worker stopped");
    }

    /// Routes one message to its handler. Handlers log their own failures;
    /// nothing here may crash the worker.
    async fn dispatch(&mut self, msg: Message) {
        match msg {
            Message::Enter(m) => self.injector.enter(&m),
            Message::Leave => self.injector.leave(),

            Message::KeyDown(m) => self.injector.key_down(m.key_button),
            // The language code is reserved; DKDL otherwise behaves as DKDN.
            Message::KeyDownLang(m) => self.injector.key_down(m.key_button),
            Message::KeyRepeat(m) => self.injector.key_repeat(m.key_button),
            Message::KeyUp(m) => self.injector.key_up(m.key_button),

            Message::MouseDown { button } => self.injector.mouse_down(button),
            Message::MouseUp { button } => self.injector.mouse_up(button),
            Message::MouseMove { x, y } => self.injector.mouse_move(x, y),
            Message::MouseRelMove { dx, dy } => self.injector.mouse_rel_move(dx, dy),
            Message::MouseWheel { x_delta, y_delta } => {
                self.injector.mouse_wheel(x_delta, y_delta)
            }

            Message::QueryInfo => {
                let reply = self.injector.screen_info();
                self.outbound.send(&reply).await;
            }
            // Echoed synchronously by the session read loop; nothing to do
            // if one still lands here (e.g. in tests).
            Message::KeepAlive => {}
            Message::InfoAck => debug!("server acknowledged our screen info"),

            Message::Close => {
                info!("server closed the session");
                self.begin_shutdown().await;
            }
            Message::ErrorIncompatible { major, minor } => {
                error!(major, minor, "incompatible protocol versions, shutting down");
                self.begin_shutdown().await;
            }
            m if m.is_protocol_error() => {
                error!(code = m.code(), "protocol error from server, shutting down");
                self.begin_shutdown().await;
            }

            Message::Unknown { code, length } => warn!(
                code = %String::from_utf8_lossy(&code),
                length,
                "dropping message with unknown code"
            ),
            other => debug!(code = other.code(), "no handler, ignoring"),
        }
    }

    async fn begin_shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.outbound.shutdown().await;
    }
}
