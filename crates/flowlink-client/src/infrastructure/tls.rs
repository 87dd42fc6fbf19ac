//! TLS transport for the session.
//!
//! Chain validation is intentionally disabled at the rustls layer: Barrier
//! servers present self-signed certificates, so the trust decision is the
//! TOFU fingerprint check in [`super::trust`], performed *after* the
//! handshake against the pinned SHA-256 of the peer's DER certificate.
//! The verifier still validates handshake signatures, so the peer must
//! actually hold the private key of whatever certificate it presents.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{
    ring, verify_tls12_signature, verify_tls13_signature, CryptoProvider,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    ClientConfig as RustlsClientConfig, DigitallySignedStruct, Error as RustlsError,
    SignatureScheme,
};
use tokio_rustls::TlsConnector;

use super::config::ClientConfig;

/// Error type for TLS setup and handshake.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("invalid server name {0:?}")]
    InvalidServerName(String),

    #[error("mtls enabled but pem_path is not configured")]
    MissingIdentityPath,

    #[error("failed to read identity PEM {path}: {source}")]
    Identity {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("identity PEM {0} contains no private key")]
    NoPrivateKey(PathBuf),

    #[error("TLS configuration rejected: {0}")]
    Config(#[from] RustlsError),

    #[error("TLS handshake failed: {0}")]
    Handshake(std::io::Error),

    #[error("peer presented no certificate")]
    NoPeerCertificate,
}

/// Accepts any certificate chain; the fingerprint pin is the trust check.
#[derive(Debug)]
struct TofuVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for TofuVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, RustlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

fn client_config(cfg: &ClientConfig) -> Result<RustlsClientConfig, TlsError> {
    let provider = Arc::new(ring::default_provider());
    let builder = RustlsClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(TofuVerifier { provider }));

    if cfg.mtls {
        let path = cfg
            .pem_path
            .as_deref()
            .ok_or(TlsError::MissingIdentityPath)?;
        let (certs, key) = load_identity(path)?;
        Ok(builder.with_client_auth_cert(certs, key)?)
    } else {
        Ok(builder.with_no_client_auth())
    }
}

/// Reads the client certificate chain and private key from one PEM file.
fn load_identity(
    path: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), TlsError> {
    let read = |path: &Path| -> Result<Box<dyn BufRead>, TlsError> {
        let file = std::fs::File::open(path).map_err(|source| TlsError::Identity {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Box::new(std::io::BufReader::new(file)))
    };

    let certs = rustls_pemfile::certs(&mut read(path)?)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Identity {
            path: path.to_path_buf(),
            source,
        })?;
    let key = rustls_pemfile::private_key(&mut read(path)?)
        .map_err(|source| TlsError::Identity {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(path.to_path_buf()))?;
    Ok((certs, key))
}

/// Wraps an established TCP stream in TLS.
pub async fn connect(cfg: &ClientConfig, tcp: TcpStream) -> Result<TlsStream<TcpStream>, TlsError> {
    let config = client_config(cfg)?;
    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(cfg.server.clone())
        .map_err(|_| TlsError::InvalidServerName(cfg.server.clone()))?;
    connector
        .connect(server_name, tcp)
        .await
        .map_err(TlsError::Handshake)
}

/// SHA-256 over the peer's DER end-entity certificate, uppercase hex.
pub fn peer_fingerprint(stream: &TlsStream<TcpStream>) -> Result<String, TlsError> {
    let (_, connection) = stream.get_ref();
    let certs = connection
        .peer_certificates()
        .ok_or(TlsError::NoPeerCertificate)?;
    let end_entity = certs.first().ok_or(TlsError::NoPeerCertificate)?;
    Ok(fingerprint_hex(end_entity.as_ref()))
}

/// Uppercase-hex SHA-256 of arbitrary DER bytes.
pub fn fingerprint_hex(der: &[u8]) -> String {
    let digest = Sha256::digest(der);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02X}"));
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
