//! TOML configuration for the client.
//!
//! Loaded from the platform config file (Linux:
//! `~/.config/flowlink/config.toml`), with every field individually
//! defaulted so a missing or partial file works on first run. Command-line
//! flags override individual fields after loading; priority is
//! CLI > file > default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Selectable virtual-device backends.
///
/// uinput is the only one implemented; libei and wlroots virtual-pointer
/// backends are candidates once the compositor protocols settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputBackend {
    Uinput,
}

/// The client configuration, one field per spec'd setting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Server host name or IP address.
    #[serde(default = "default_server")]
    pub server: String,
    /// Server TCP port (TLS uses the same port when enabled).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Screen name announced in `HelloBack`; must match the server's screen
    /// map. Defaults to the local hostname.
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Fixed screen size; when absent the platform probe decides.
    #[serde(default)]
    pub screen_width: Option<u16>,
    #[serde(default)]
    pub screen_height: Option<u16>,

    #[serde(default)]
    pub mouse_backend: Option<InputBackend>,
    #[serde(default)]
    pub keyboard_backend: Option<InputBackend>,

    /// Emit every accepted `DMMV` as an absolute move instead of relative
    /// moves with periodic absolute reseeds.
    #[serde(default)]
    pub abs_mouse_move: bool,
    /// Minimum interval between emitted mouse moves, in milliseconds
    /// (8 ms ≈ 125 Hz balances smoothness against event volume).
    #[serde(default = "default_move_threshold_ms")]
    pub mouse_move_threshold_ms: u64,
    /// Reseed the logical cursor with an absolute move every N accepted
    /// `DMMV` events.
    #[serde(default = "default_sync_freq")]
    pub mouse_pos_sync_freq: u32,

    /// Wrap the connection in TLS.
    #[serde(default)]
    pub tls: bool,
    /// Present a client certificate during the TLS handshake.
    #[serde(default)]
    pub mtls: bool,
    /// Skip the trust-on-first-use fingerprint check entirely.
    #[serde(default)]
    pub tls_trust: bool,
    /// PEM file holding the client identity (certificate + private key)
    /// used when `mtls` is enabled.
    #[serde(default)]
    pub pem_path: Option<PathBuf>,

    /// `tracing` log level filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_server() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    24800
}
fn default_move_threshold_ms() -> u64 {
    8
}
fn default_sync_freq() -> u32 {
    2
}
fn default_log_level() -> String {
    "info".to_string()
}

/// The local hostname, or a fixed fallback when it cannot be read.
fn default_client_name() -> String {
    #[cfg(target_os = "linux")]
    if let Ok(name) = std::fs::read_to_string("/etc/hostname") {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    std::env::var("HOSTNAME").unwrap_or_else(|_| "flowlink".to_string())
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_port(),
            client_name: default_client_name(),
            screen_width: None,
            screen_height: None,
            mouse_backend: None,
            keyboard_backend: None,
            abs_mouse_move: false,
            mouse_move_threshold_ms: default_move_threshold_ms(),
            mouse_pos_sync_freq: default_sync_freq(),
            tls: false,
            mtls: false,
            tls_trust: false,
            pem_path: None,
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    /// The fixed screen size, when both dimensions are configured.
    pub fn configured_screen(&self) -> Option<(u16, u16)> {
        match (self.screen_width, self.screen_height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        }
    }
}

/// The platform config directory for this application.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Full path of the default config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the configuration from `path`, or from the default location when
/// `path` is `None`. A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(source) => Err(ConfigError::Io { path, source }),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("flowlink"))
    }

    #[cfg(not(target_os = "linux"))]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config").join("flowlink"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_spec_values() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.server, "localhost");
        assert_eq!(cfg.port, 24800);
        assert!(!cfg.abs_mouse_move);
        assert_eq!(cfg.mouse_move_threshold_ms, 8);
        assert_eq!(cfg.mouse_pos_sync_freq, 2);
        assert!(!cfg.tls);
        assert!(!cfg.mtls);
        assert!(!cfg.tls_trust);
        assert_eq!(cfg.screen_width, None);
        assert!(!cfg.client_name.is_empty());
    }

    #[test]
    fn test_empty_toml_deserializes_to_defaults() {
        let cfg: ClientConfig = toml::from_str("").expect("empty config must parse");
        assert_eq!(cfg.port, 24800);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let cfg: ClientConfig = toml::from_str(
            r#"
server = "10.0.0.2"
tls = true
mouse_backend = "uinput"
"#,
        )
        .expect("parse");
        assert_eq!(cfg.server, "10.0.0.2");
        assert!(cfg.tls);
        assert_eq!(cfg.mouse_backend, Some(InputBackend::Uinput));
        // Untouched fields keep their defaults.
        assert_eq!(cfg.port, 24800);
        assert_eq!(cfg.mouse_pos_sync_freq, 2);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let mut cfg = ClientConfig::default();
        cfg.server = "barrier.lan".to_string();
        cfg.screen_width = Some(2560);
        cfg.screen_height = Some(1440);
        cfg.pem_path = Some(PathBuf::from("/etc/flowlink/identity.pem"));

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: ClientConfig = toml::from_str(&text).expect("deserialize");
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_configured_screen_requires_both_dimensions() {
        let mut cfg = ClientConfig::default();
        assert_eq!(cfg.configured_screen(), None);
        cfg.screen_width = Some(1920);
        assert_eq!(cfg.configured_screen(), None);
        cfg.screen_height = Some(1080);
        assert_eq!(cfg.configured_screen(), Some((1920, 1080)));
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let result: Result<ClientConfig, _> = toml::from_str("[[[ not toml");
        assert!(result.is_err());
    }
}
