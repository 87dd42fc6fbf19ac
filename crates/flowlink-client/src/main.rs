//! Flowlink client entry point.
//!
//! Wires configuration, the virtual devices, the trust store, the session,
//! and the dispatcher together, then runs two tasks to completion: the
//! socket read loop (producer) and the dispatcher worker (consumer).
//!
//! Exit codes: 0 on normal shutdown, 1 on an unhandled error, 130 on
//! keyboard interrupt.

use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flowlink_client::application::device::{KeyboardDevice, MouseDevice};
use flowlink_client::application::{
    dispatch_channel, CursorContext, InjectorSettings, InputInjector, StateHandle, Worker,
};
use flowlink_client::infrastructure::input::screen::WaylandScreenProbe;
use flowlink_client::infrastructure::{load_config, ClientConfig, Session, TrustStore};

/// Barrier/Synergy/Deskflow secondary-screen client.
///
/// Command-line flags override the TOML configuration; priority is
/// CLI > config file > built-in default.
#[derive(Parser, Debug)]
#[command(name = "flowlink-client", version)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server host name or IP address.
    #[arg(short, long)]
    server: Option<String>,

    /// Server TCP port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Screen name announced to the server.
    #[arg(long)]
    client_name: Option<String>,

    /// Fixed screen width (skips the platform probe).
    #[arg(long)]
    screen_width: Option<u16>,

    /// Fixed screen height (skips the platform probe).
    #[arg(long)]
    screen_height: Option<u16>,

    /// Emit absolute mouse moves instead of relative ones.
    #[arg(long)]
    abs_mouse_move: bool,

    /// Minimum interval between emitted mouse moves, in milliseconds.
    #[arg(long)]
    mouse_move_threshold_ms: Option<u64>,

    /// Reseed the cursor absolutely every N accepted moves.
    #[arg(long)]
    mouse_pos_sync_freq: Option<u32>,

    /// Wrap the connection in TLS.
    #[arg(long)]
    tls: bool,

    /// Present a client certificate (requires --pem-path or pem_path).
    #[arg(long)]
    mtls: bool,

    /// Skip the trust-on-first-use fingerprint check.
    #[arg(long)]
    tls_trust: bool,

    /// PEM file with the client identity for mTLS.
    #[arg(long)]
    pem_path: Option<PathBuf>,

    /// Log level filter when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,
}

fn apply_overrides(cfg: &mut ClientConfig, cli: &Cli) {
    if let Some(server) = &cli.server {
        cfg.server = server.clone();
    }
    if let Some(port) = cli.port {
        cfg.port = port;
    }
    if let Some(name) = &cli.client_name {
        cfg.client_name = name.clone();
    }
    if let Some(w) = cli.screen_width {
        cfg.screen_width = Some(w);
    }
    if let Some(h) = cli.screen_height {
        cfg.screen_height = Some(h);
    }
    if cli.abs_mouse_move {
        cfg.abs_mouse_move = true;
    }
    if let Some(ms) = cli.mouse_move_threshold_ms {
        cfg.mouse_move_threshold_ms = ms;
    }
    if let Some(freq) = cli.mouse_pos_sync_freq {
        cfg.mouse_pos_sync_freq = freq;
    }
    if cli.tls {
        cfg.tls = true;
    }
    if cli.mtls {
        cfg.mtls = true;
        cfg.tls = true;
    }
    if cli.tls_trust {
        cfg.tls_trust = true;
    }
    if let Some(path) = &cli.pem_path {
        cfg.pem_path = Some(path.clone());
    }
    if let Some(level) = &cli.log_level {
        cfg.log_level = level.clone();
    }
}

#[cfg(target_os = "linux")]
fn build_devices(
    screen: (u16, u16),
) -> anyhow::Result<(Box<dyn MouseDevice>, Box<dyn KeyboardDevice>)> {
    use flowlink_client::infrastructure::input::uinput::{UinputKeyboard, UinputMouse};

    let mouse = UinputMouse::new(screen)
        .map_err(|e| anyhow::anyhow!("creating virtual mouse: {e} (is /dev/uinput accessible?)"))?;
    let keyboard = UinputKeyboard::new()
        .map_err(|e| anyhow::anyhow!("creating virtual keyboard: {e}"))?;
    Ok((Box::new(mouse), Box::new(keyboard)))
}

#[cfg(not(target_os = "linux"))]
fn build_devices(
    _screen: (u16, u16),
) -> anyhow::Result<(Box<dyn MouseDevice>, Box<dyn KeyboardDevice>)> {
    anyhow::bail!("no virtual-device backend for this platform (uinput is Linux-only)")
}

/// Interactive TOFU prompt on the controlling terminal.
fn prompt_user(question: &str) -> bool {
    use std::io::Write;

    eprintln!("{question}");
    eprint!("Accept? [y/N] ");
    let _ = std::io::stderr().flush();

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim(), "y" | "Y" | "yes" | "YES")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = load_config(cli.config.as_deref()).context("loading configuration")?;
    apply_overrides(&mut cfg, &cli);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.log_level.clone())),
        )
        .init();
    info!("Flowlink client starting");

    // Geometry first: the virtual mouse needs the absolute-axis bounds.
    let cursor = CursorContext::new(
        Box::new(WaylandScreenProbe::new()),
        cfg.configured_screen(),
    );
    let screen = cursor.screen_size();
    info!(width = screen.0, height = screen.1, "screen geometry");

    let (mouse, keyboard) = build_devices(screen)?;

    let state = StateHandle::new();
    let settings = InjectorSettings {
        abs_mouse_move: cfg.abs_mouse_move,
        move_threshold: Duration::from_millis(cfg.mouse_move_threshold_ms),
        sync_freq: cfg.mouse_pos_sync_freq.max(1),
    };
    let injector = InputInjector::new(mouse, keyboard, cursor, state.clone(), settings);

    let mut trust = if cfg.tls && !cfg.tls_trust {
        Some(TrustStore::open_default().context("opening trust store")?)
    } else {
        None
    };

    let session = Session::connect(&cfg, trust.as_mut(), state.clone(), &mut |q| {
        prompt_user(q)
    })
    .await
    .context("establishing session")?;

    let running = Arc::new(AtomicBool::new(true));
    let interrupted = Arc::new(AtomicBool::new(false));

    let (queue_tx, queue_rx) = dispatch_channel();
    let writer = session.writer();
    let worker = Worker::new(queue_rx, injector, writer.clone(), Arc::clone(&running));
    let worker_task = tokio::spawn(worker.run());

    // A keyboard interrupt takes the same path as a server-driven shutdown:
    // stop flag, then close the writer so the reader EOFs.
    {
        let running = Arc::clone(&running);
        let interrupted = Arc::clone(&interrupted);
        let writer = writer.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                interrupted.store(true, Ordering::Relaxed);
                running.store(false, Ordering::Relaxed);
                writer.shutdown().await;
            }
        });
    }

    session.read_loop(queue_tx, Arc::clone(&running)).await;
    let _ = worker_task.await;

    if interrupted.load(Ordering::Relaxed) {
        info!("Flowlink client stopped (interrupt)");
        process::exit(130);
    }
    info!("Flowlink client stopped");
    Ok(())
}
