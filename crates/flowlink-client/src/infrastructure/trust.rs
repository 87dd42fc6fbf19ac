//! Trust-on-first-use store for server certificate fingerprints.
//!
//! The client does not validate certificate chains: a Barrier server's
//! certificate is almost always self-signed. Instead the SHA-256
//! fingerprint of the peer certificate is pinned per server address in
//! `known_hosts.json`, the ssh model:
//!
//! - unknown host → ask the user; accepting persists the fingerprint;
//! - fingerprint mismatch → warn loudly and ask again; rejecting aborts;
//! - match → proceed silently.
//!
//! The file is a flat JSON object `{ "host:port": "UPPERHEX" }` written
//! atomically (temp file + rename) so a crash cannot leave a torn store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use super::config::{config_dir, ConfigError};

/// Error type for trust store operations.
#[derive(Debug, Error)]
pub enum TrustError {
    /// The store location could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A file system I/O error occurred.
    #[error("I/O error accessing trust store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store content is not valid JSON.
    #[error("failed to parse trust store: {0}")]
    Parse(#[from] serde_json::Error),

    /// The user declined the presented certificate.
    #[error("server certificate rejected by user")]
    Rejected,
}

/// Outcome of looking up a server's fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustCheck {
    /// Address known, fingerprint matches.
    Known,
    /// Address never seen before.
    Unknown,
    /// Address known with a *different* fingerprint.
    Mismatch { stored: String },
}

/// Scoped handle over `known_hosts.json`.
pub struct TrustStore {
    path: PathBuf,
    hosts: BTreeMap<String, String>,
}

impl TrustStore {
    /// Opens the store at its default location, creating an empty one in
    /// memory if the file does not exist yet.
    pub fn open_default() -> Result<Self, TrustError> {
        Self::open(config_dir()?.join("known_hosts.json"))
    }

    /// Opens the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TrustError> {
        let path = path.into();
        let hosts = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(TrustError::Io { path, source }),
        };
        Ok(Self { path, hosts })
    }

    /// Compares `fingerprint` against the stored entry for `address`.
    pub fn check(&self, address: &str, fingerprint: &str) -> TrustCheck {
        match self.hosts.get(address) {
            None => TrustCheck::Unknown,
            Some(stored) if stored == fingerprint => TrustCheck::Known,
            Some(stored) => TrustCheck::Mismatch {
                stored: stored.clone(),
            },
        }
    }

    /// Records (or replaces) the fingerprint for `address` and persists.
    pub fn record(&mut self, address: &str, fingerprint: &str) -> Result<(), TrustError> {
        self.hosts
            .insert(address.to_string(), fingerprint.to_string());
        self.save()
    }

    /// Runs the full TOFU decision for one connection attempt.
    ///
    /// `confirm` is asked when the fingerprint is unknown or differs; it
    /// receives a human-readable question and answers accept/reject.
    ///
    /// # Errors
    ///
    /// [`TrustError::Rejected`] when the user declines; persistence errors
    /// when recording an accepted fingerprint fails.
    pub fn authorize(
        &mut self,
        address: &str,
        fingerprint: &str,
        confirm: &mut dyn FnMut(&str) -> bool,
    ) -> Result<(), TrustError> {
        match self.check(address, fingerprint) {
            TrustCheck::Known => Ok(()),
            TrustCheck::Unknown => {
                let question = format!(
                    "The authenticity of server '{address}' can't be established.\n\
                     SHA-256 fingerprint: {fingerprint}\n\
                     Trust this server and remember its fingerprint?"
                );
                if confirm(&question) {
                    info!(address, "pinning new server fingerprint");
                    self.record(address, fingerprint)
                } else {
                    Err(TrustError::Rejected)
                }
            }
            TrustCheck::Mismatch { stored } => {
                warn!(
                    address,
                    stored,
                    presented = fingerprint,
                    "server certificate fingerprint changed"
                );
                let question = format!(
                    "WARNING: the certificate of '{address}' has CHANGED.\n\
                     Stored:    {stored}\n\
                     Presented: {fingerprint}\n\
                     This may be a man-in-the-middle attack. Trust the new certificate?"
                );
                if confirm(&question) {
                    self.record(address, fingerprint)
                } else {
                    Err(TrustError::Rejected)
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the store atomically: serialize to a sibling temp file, then
    /// rename over the target.
    fn save(&self) -> Result<(), TrustError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| TrustError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&self.hosts)?;
        std::fs::write(&tmp, content).map_err(|source| TrustError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| TrustError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
