//! Centralized relay configuration.
//!
//! This module provides strongly-typed configuration for the relay,
//! loaded via the `config` crate from environment variables. Nested
//! values use `__` as the separator, e.g. `TLS__CERT_PATH`.

use pagechat_messaging::NetworkEnv;
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Relay configuration.
#[derive(Clone, Deserialize)]
pub struct RelayConfig {
    /// Hex secret of the relay's signing key (`KEY`).
    /// When absent a generated key is kept in [`Self::key_file_path`].
    #[serde(default)]
    pub key: Option<String>,

    /// Where a generated signing key is stored.
    /// Defaults to `relay.key` inside the cache directory.
    #[serde(default)]
    pub key_file: Option<PathBuf>,

    /// Socket address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Path of the URL-to-conversation snapshot.
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Root directory for per-identity session state.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Messaging network environment.
    #[serde(default)]
    pub network_env: NetworkEnv,

    /// TLS configuration.
    #[serde(default)]
    pub tls: TlsConfig,
}

/// TLS listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsConfig {
    /// Serve HTTPS. Disable only for local development.
    #[serde(default = "default_tls_enabled")]
    pub enabled: bool,

    /// PEM certificate chain.
    #[serde(default = "default_cert_path")]
    pub cert_path: PathBuf,

    /// PEM private key.
    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,

    /// Optional PEM CA bundle appended to the certificate chain.
    #[serde(default)]
    pub ca_path: Option<PathBuf>,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 443))
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("storage.txt")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache")
}

fn default_tls_enabled() -> bool {
    true
}

fn default_cert_path() -> PathBuf {
    PathBuf::from("certs/cert.pem")
}

fn default_key_path() -> PathBuf {
    PathBuf::from("certs/key.pem")
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: default_tls_enabled(),
            cert_path: default_cert_path(),
            key_path: default_key_path(),
            ca_path: None,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    pub(crate) fn from_environment(
        environment: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the path of the generated signing key file.
    #[must_use]
    pub fn key_file_path(&self) -> PathBuf {
        self.key_file
            .clone()
            .unwrap_or_else(|| self.cache_dir.join("relay.key"))
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("key_file", &self.key_file)
            .field("listen_addr", &self.listen_addr)
            .field("storage_path", &self.storage_path)
            .field("cache_dir", &self.cache_dir)
            .field("network_env", &self.network_env)
            .field("tls", &self.tls)
            .finish()
    }
}
