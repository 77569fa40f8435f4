//! The signing credential the relay acts as.
//!
//! The secret never appears in `Debug` output or logs.

use crate::address::{IdentitySignature, WalletAddress, personal_message_hash};
use crate::error::IdentityError;
use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use rootcause::Report;
use std::fmt;

/// A secp256k1 signing key together with its wallet address.
#[derive(Clone)]
pub struct Credential {
    signing_key: SigningKey,
    address: WalletAddress,
}

impl Credential {
    /// Generates a fresh random credential.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng))
    }

    /// Parses a hex-encoded secret key, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MalformedSecret`] if the input is not 32
    /// bytes of hex or is not a valid scalar.
    pub fn from_hex(secret: &str) -> Result<Self, Report<IdentityError>> {
        let trimmed = secret.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|e| IdentityError::MalformedSecret {
            reason: e.to_string(),
        })?;
        if bytes.len() != 32 {
            return Err(IdentityError::MalformedSecret {
                reason: format!("expected 32 bytes, got {}", bytes.len()),
            }
            .into());
        }
        let signing_key =
            SigningKey::from_slice(&bytes).map_err(|e| IdentityError::MalformedSecret {
                reason: e.to_string(),
            })?;
        Ok(Self::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = WalletAddress::from_verifying_key(signing_key.verifying_key());
        Self {
            signing_key,
            address,
        }
    }

    /// Returns the wallet address of this credential.
    #[must_use]
    pub fn address(&self) -> WalletAddress {
        self.address
    }

    /// Returns the `0x` prefixed hex secret, for writing to the key file.
    #[must_use]
    pub fn to_hex_secret(&self) -> String {
        format!("0x{}", hex::encode(self.signing_key.to_bytes()))
    }

    /// Signs `message` with EIP-191 `personal_sign` semantics.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::SigningFailed`] if the signer rejects the digest.
    pub fn sign_message(&self, message: &[u8]) -> Result<IdentitySignature, Report<IdentityError>> {
        let digest = personal_message_hash(message);
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| IdentityError::SigningFailed {
                reason: e.to_string(),
            })?;
        Ok(IdentitySignature::from_parts(&signature, recovery_id))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::recover_signer;

    const KNOWN_SECRET: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn derives_known_address() {
        let credential = Credential::from_hex(KNOWN_SECRET).expect("valid secret");
        assert_eq!(
            credential.address().to_checksum(),
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
        );
    }

    #[test]
    fn accepts_secret_without_prefix() {
        let with = Credential::from_hex(KNOWN_SECRET).expect("with prefix");
        let without = Credential::from_hex(&KNOWN_SECRET[2..]).expect("without prefix");
        assert_eq!(with.address(), without.address());
    }

    #[test]
    fn rejects_malformed_secret() {
        assert!(Credential::from_hex("0xnothex").is_err());
        assert!(Credential::from_hex("0x1234").is_err());
        // Zero is not a valid scalar.
        assert!(Credential::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn hex_secret_roundtrips() {
        let credential = Credential::generate();
        let restored = Credential::from_hex(&credential.to_hex_secret()).expect("roundtrip");
        assert_eq!(credential.address(), restored.address());
    }

    #[test]
    fn signature_recovers_signer() {
        let credential = Credential::generate();
        let signature = credential.sign_message(b"register inbox").expect("sign");

        let signer = recover_signer(b"register inbox", &signature).expect("recover");
        assert_eq!(signer, credential.address());

        let other = recover_signer(b"something else", &signature).expect("recover");
        assert_ne!(other, credential.address());
    }

    #[test]
    fn debug_redacts_secret() {
        let credential = Credential::from_hex(KNOWN_SECRET).expect("valid secret");
        let debug = format!("{credential:?}");
        assert!(!debug.contains("4c0883a6"));
        assert!(debug.contains("redacted"));
    }
}
