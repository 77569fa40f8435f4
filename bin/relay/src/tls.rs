//! TLS material for the HTTPS listener.

use crate::config::TlsConfig;
use crate::error::StartupError;
use axum_server::tls_rustls::RustlsConfig;
use rootcause::Report;
use std::path::Path;

/// Builds the rustls configuration from the PEM files named in `tls`.
///
/// The optional CA bundle is appended to the certificate chain.
///
/// # Errors
///
/// Returns [`StartupError::Tls`] if a file cannot be read or the PEM
/// contents are rejected.
pub async fn rustls_config(tls: &TlsConfig) -> Result<RustlsConfig, Report<StartupError>> {
    let mut chain = read_pem(&tls.cert_path).await?;
    if let Some(ca_path) = &tls.ca_path {
        let ca = read_pem(ca_path).await?;
        if !chain.ends_with(b"\n") {
            chain.push(b'\n');
        }
        chain.extend_from_slice(&ca);
    }
    let key = read_pem(&tls.key_path).await?;

    RustlsConfig::from_pem(chain, key).await.map_err(|e| {
        StartupError::Tls {
            path: tls.cert_path.display().to_string(),
            details: e.to_string(),
        }
        .into()
    })
}

async fn read_pem(path: &Path) -> Result<Vec<u8>, Report<StartupError>> {
    tokio::fs::read(path).await.map_err(|e| {
        StartupError::Tls {
            path: path.display().to_string(),
            details: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn missing_certificate_is_reported_with_path() {
        let tls = TlsConfig {
            enabled: true,
            cert_path: PathBuf::from("/nonexistent/cert.pem"),
            key_path: PathBuf::from("/nonexistent/key.pem"),
            ca_path: None,
        };

        let err = rustls_config(&tls).await.expect_err("missing files");

        assert!(err.to_string().contains("/nonexistent/cert.pem"));
    }

    #[tokio::test]
    async fn garbage_pem_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cert_path = dir.path().join("cert.pem");
        let key_path = dir.path().join("key.pem");
        std::fs::write(&cert_path, b"not a certificate").expect("cert");
        std::fs::write(&key_path, b"not a key").expect("key");
        let tls = TlsConfig {
            enabled: true,
            cert_path,
            key_path,
            ca_path: None,
        };

        assert!(rustls_config(&tls).await.is_err());
    }
}
