//! Selecting the relay's credential at startup.
//!
//! A configured secret always wins. Without one, a previously generated
//! key is reloaded from the key file so the relay keeps the same network
//! identity across restarts. Only when neither exists is a new key
//! generated, and it is written to the key file before being used.

use crate::credential::Credential;
use crate::error::IdentityError;
use pagechat_core::write_atomic;
use rootcause::Report;
use std::path::Path;
use tracing::{info, warn};

/// Where the credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Supplied through configuration.
    Configured,
    /// Reloaded from the key file.
    KeyFile,
    /// Generated on this start and written to the key file.
    Generated,
}

/// A credential and its origin.
#[derive(Debug, Clone)]
pub struct ObtainedCredential {
    pub credential: Credential,
    pub source: CredentialSource,
}

/// Obtains the relay's credential.
///
/// # Errors
///
/// Returns an error if the configured secret or the key file contents are
/// malformed, or if a generated key cannot be persisted.
pub fn obtain_credential(
    configured_secret: Option<&str>,
    key_file: &Path,
) -> Result<ObtainedCredential, Report<IdentityError>> {
    if let Some(secret) = configured_secret.filter(|s| !s.trim().is_empty()) {
        let credential = Credential::from_hex(secret)?;
        info!(address = %credential.address(), "Using configured signing key");
        return Ok(ObtainedCredential {
            credential,
            source: CredentialSource::Configured,
        });
    }

    match std::fs::read_to_string(key_file) {
        Ok(contents) => {
            let credential = Credential::from_hex(&contents)?;
            info!(
                address = %credential.address(),
                key_file = %key_file.display(),
                "Loaded signing key from key file"
            );
            return Ok(ObtainedCredential {
                credential,
                source: CredentialSource::KeyFile,
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(IdentityError::KeyFileUnreadable {
                path: key_file.display().to_string(),
                reason: e.to_string(),
            }
            .into());
        }
    }

    let credential = Credential::generate();
    // Temporary files are created owner-only, and the rename keeps that mode.
    write_atomic(key_file, credential.to_hex_secret().as_bytes()).map_err(|e| {
        IdentityError::KeyFileWrite {
            path: key_file.display().to_string(),
            reason: e.to_string(),
        }
    })?;
    warn!(
        address = %credential.address(),
        key_file = %key_file.display(),
        "KEY not set; generated a new signing key. Set KEY to pin the relay identity"
    );

    Ok(ObtainedCredential {
        credential,
        source: CredentialSource::Generated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn configured_secret_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key_file = dir.path().join("relay.key");

        let obtained = obtain_credential(Some(SECRET), &key_file).expect("obtain");

        assert_eq!(obtained.source, CredentialSource::Configured);
        assert!(!key_file.exists());
    }

    #[test]
    fn blank_secret_is_treated_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key_file = dir.path().join("relay.key");

        let obtained = obtain_credential(Some("  "), &key_file).expect("obtain");

        assert_eq!(obtained.source, CredentialSource::Generated);
    }

    #[test]
    fn generated_key_is_persisted_and_reloaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key_file = dir.path().join("keys").join("relay.key");

        let first = obtain_credential(None, &key_file).expect("generate");
        assert_eq!(first.source, CredentialSource::Generated);
        assert!(key_file.exists());

        let second = obtain_credential(None, &key_file).expect("reload");
        assert_eq!(second.source, CredentialSource::KeyFile);
        assert_eq!(first.credential.address(), second.credential.address());
    }

    #[cfg(unix)]
    #[test]
    fn generated_key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let key_file = dir.path().join("relay.key");
        obtain_credential(None, &key_file).expect("generate");

        let mode = std::fs::metadata(&key_file).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn malformed_configured_secret_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = obtain_credential(Some("0xdeadbeef"), &dir.path().join("relay.key"));
        assert!(result.is_err());
    }

    #[test]
    fn corrupt_key_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let key_file = dir.path().join("relay.key");
        std::fs::write(&key_file, "garbage").expect("seed");

        let result = obtain_credential(None, &key_file);
        assert!(result.is_err());
    }
}
