//! The connection: TCP (optionally TLS), version handshake, and the read
//! loop feeding the dispatcher.
//!
//! Lifecycle:
//!
//! 1. `Disconnected → Connecting`: open TCP, optionally wrap in TLS and run
//!    the trust-on-first-use fingerprint check.
//! 2. `Connecting → Handshake`: read the server's `Hello` (10-second
//!    deadline), echo its protocol name and version in `HelloBack` together
//!    with our screen name.
//! 3. `Handshake → Connected`: enter the read loop. Bytes are fed to the
//!    parser; complete messages are enqueued for the dispatcher. `CALV` is
//!    echoed synchronously from here — it is the server's liveness probe
//!    and must not wait behind queued input events.
//!
//! Shutdown from either side works by closing the writer half: the peer
//! (or our own reader) then sees EOF, the read loop returns, the queue
//! sender drops, and the worker drains and releases everything. Both
//! halves are closed on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, trace};

use flowlink_core::encode_frame;
use flowlink_core::protocol::codec::HandshakeKind;
use flowlink_core::protocol::messages::{HelloBackMsg, HelloMsg, Message};
use flowlink_core::protocol::parser::{ParseError, StreamParser};

use crate::application::dispatcher::ReplySink;
use crate::application::state::{SessionState, StateHandle};

use super::config::ClientConfig;
use super::tls::{self, TlsError};
use super::trust::{TrustError, TrustStore};

/// Deadline for the server's `Hello` after the transport is up.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Object-safe alias over the plain and TLS stream types.
pub trait SessionStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> SessionStream for T {}

pub type IoStream = Box<dyn SessionStream>;

/// Errors raised while establishing or driving the connection.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Trust(#[from] TrustError),

    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("handshake timed out after 10 seconds")]
    HandshakeTimeout,

    #[error("server closed the connection during handshake")]
    HandshakeEof,

    #[error(transparent)]
    Parse(#[from] ParseError),
}

// ── Outbound writer handle ────────────────────────────────────────────────────

/// Clonable handle over the writer half, shared by the read loop (keep-alive
/// echo) and the dispatcher worker (`DINF` replies, shutdown).
#[derive(Clone)]
pub struct MessageSender {
    inner: Arc<Mutex<Option<WriteHalf<IoStream>>>>,
}

impl MessageSender {
    pub fn new(writer: WriteHalf<IoStream>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(writer))),
        }
    }

    /// Encodes and writes one framed message.
    pub async fn send(&self, msg: &Message) -> std::io::Result<()> {
        self.send_raw(&encode_frame(msg)).await
    }

    pub async fn send_raw(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut guard = self.inner.lock().await;
        match guard.as_mut() {
            Some(writer) => {
                writer.write_all(bytes).await?;
                writer.flush().await
            }
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "writer already closed",
            )),
        }
    }

    /// Closes the writer half, which EOFs the peer's reader (and ours).
    /// Idempotent.
    pub async fn shutdown(&self) {
        let mut guard = self.inner.lock().await;
        if let Some(mut writer) = guard.take() {
            let _ = writer.shutdown().await;
        }
    }
}

#[async_trait]
impl ReplySink for MessageSender {
    async fn send(&self, msg: &Message) {
        if let Err(e) = MessageSender::send(self, msg).await {
            error!(code = msg.code(), error = %e, "failed to send message");
        }
    }

    async fn shutdown(&self) {
        MessageSender::shutdown(self).await;
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// An established connection, past its handshake.
pub struct Session {
    reader: ReadHalf<IoStream>,
    writer: MessageSender,
    parser: StreamParser,
    state: StateHandle,
    server_hello: HelloMsg,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    /// Connects, verifies trust (when a store is given), and completes the
    /// handshake.
    ///
    /// `trust` is `Some` only when TLS is on and `tls_trust` is off;
    /// `confirm` answers the TOFU prompts.
    pub async fn connect(
        cfg: &ClientConfig,
        trust: Option<&mut TrustStore>,
        state: StateHandle,
        confirm: &mut dyn FnMut(&str) -> bool,
    ) -> Result<Self, SessionError> {
        state.set(SessionState::Connecting);
        let addr = format!("{}:{}", cfg.server, cfg.port);
        info!(%addr, tls = cfg.tls, "connecting");

        let tcp = TcpStream::connect((cfg.server.as_str(), cfg.port))
            .await
            .map_err(|source| SessionError::Connect {
                addr: addr.clone(),
                source,
            })?;

        let stream: IoStream = if cfg.tls {
            let tls_stream = tls::connect(cfg, tcp).await?;
            match trust {
                Some(store) => {
                    let fingerprint = tls::peer_fingerprint(&tls_stream)?;
                    store.authorize(&addr, &fingerprint, confirm)?;
                }
                None => debug!("tls_trust set, skipping fingerprint check"),
            }
            Box::new(tls_stream)
        } else {
            Box::new(tcp)
        };

        let (mut reader, writer_half) = tokio::io::split(stream);
        let writer = MessageSender::new(writer_half);
        let mut parser = StreamParser::new();

        state.set(SessionState::Handshake);
        let server_hello =
            tokio::time::timeout(HANDSHAKE_TIMEOUT, read_hello(&mut reader, &mut parser))
                .await
                .map_err(|_| SessionError::HandshakeTimeout)??;
        debug!(
            protocol = %server_hello.protocol,
            major = server_hello.major,
            minor = server_hello.minor,
            "server hello received"
        );

        // Echo the server's protocol name and version, add our screen name.
        writer
            .send(&Message::HelloBack(HelloBackMsg {
                protocol: server_hello.protocol,
                major: server_hello.major,
                minor: server_hello.minor,
                name: cfg.client_name.clone(),
            }))
            .await?;

        state.set(SessionState::Connected);
        info!(
            "connected to {} {}.{} as {:?}",
            server_hello.protocol, server_hello.major, server_hello.minor, cfg.client_name
        );

        Ok(Session {
            reader,
            writer,
            parser,
            state,
            server_hello,
        })
    }

    /// The server's greeting, recorded at handshake.
    pub fn server_hello(&self) -> &HelloMsg {
        &self.server_hello
    }

    /// A clone of the outbound writer handle.
    pub fn writer(&self) -> MessageSender {
        self.writer.clone()
    }

    /// Reads until EOF, error, or shutdown, enqueueing every decoded
    /// message. Consumes the session; the writer is closed and the state is
    /// `Disconnected` when this returns.
    pub async fn read_loop(mut self, queue: mpsc::Sender<Message>, running: Arc<AtomicBool>) {
        let mut buf = [0u8; 4096];
        'read: loop {
            if !running.load(Ordering::Relaxed) {
                info!("shutdown requested, leaving read loop");
                break;
            }
            let n = match self.reader.read(&mut buf).await {
                Ok(0) => {
                    info!("server closed the connection");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    // A reset after our own shutdown is expected noise.
                    if running.load(Ordering::Relaxed) {
                        error!(error = %e, "read error on control channel");
                    }
                    break;
                }
            };

            self.parser.feed(&buf[..n]);
            loop {
                match self.parser.next_message() {
                    Ok(Some(Message::KeepAlive)) => {
                        // Liveness probe: echo the same bytes immediately,
                        // ahead of anything sitting in the dispatch queue.
                        if let Err(e) = self.writer.send(&Message::KeepAlive).await {
                            error!(error = %e, "keep-alive echo failed");
                            break 'read;
                        }
                        trace!("keep-alive echoed");
                    }
                    Ok(Some(msg)) => {
                        trace!(code = msg.code(), "enqueueing message");
                        if queue.send(msg).await.is_err() {
                            debug!("dispatch queue closed, leaving read loop");
                            break 'read;
                        }
                    }
                    Ok(None) => break,
                    Err(e @ ParseError::OversizeFrame { .. }) => {
                        error!(error = %e, "oversize frame, receive buffer flushed");
                    }
                    Err(e) => {
                        error!(error = %e, "discarding malformed frame");
                    }
                }
            }
        }

        self.writer.shutdown().await;
        self.state.set(SessionState::Disconnected);
    }
}

async fn read_hello(
    reader: &mut ReadHalf<IoStream>,
    parser: &mut StreamParser,
) -> Result<HelloMsg, SessionError> {
    let mut buf = [0u8; 1024];
    loop {
        if let Some(msg) = parser.next_handshake(HandshakeKind::Hello)? {
            // next_handshake(Hello) can only produce a Hello.
            if let Message::Hello(hello) = msg {
                return Ok(hello);
            }
        }
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Err(SessionError::HandshakeEof);
        }
        parser.feed(&buf[..n]);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
