//! Wallet addresses and EIP-191 signatures.

use crate::error::IdentityError;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use rootcause::Report;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// A 20-byte account address derived from a secp256k1 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletAddress([u8; 20]);

impl WalletAddress {
    /// Derives the address of a public key: the last 20 bytes of the
    /// Keccak-256 hash of the uncompressed point without its tag byte.
    #[must_use]
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let hash = Keccak256::digest(&point.as_bytes()[1..]);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }

    /// Returns the raw address bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns the EIP-55 mixed-case checksum encoding, `0x` prefixed.
    #[must_use]
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl FromStr for WalletAddress {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let decoded = hex::decode(digits).map_err(|e| IdentityError::InvalidAddress {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        let bytes: [u8; 20] = decoded
            .try_into()
            .map_err(|v: Vec<u8>| IdentityError::InvalidAddress {
                input: s.to_string(),
                reason: format!("expected 20 bytes, got {}", v.len()),
            })?;
        Ok(Self(bytes))
    }
}

impl Serialize for WalletAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for WalletAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A 65-byte recoverable ECDSA signature laid out as `r || s || v`, with
/// `v` in the 27/28 convention used by `personal_sign`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IdentitySignature([u8; 65]);

impl IdentitySignature {
    pub(crate) fn from_parts(signature: &Signature, recovery_id: RecoveryId) -> Self {
        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = 27 + recovery_id.to_byte();
        Self(bytes)
    }

    /// Wraps raw signature bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }

    /// Returns the raw signature bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// Returns the `0x` prefixed hex encoding.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for IdentitySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IdentitySignature").field(&self.to_hex()).finish()
    }
}

/// Hashes `message` the way `personal_sign` does (EIP-191 version 0x45).
#[must_use]
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Recovers the address that produced `signature` over `message`.
///
/// # Errors
///
/// Returns [`IdentityError::InvalidSignature`] if the signature bytes are
/// malformed or no public key can be recovered from them.
pub fn recover_signer(
    message: &[u8],
    signature: &IdentitySignature,
) -> Result<WalletAddress, Report<IdentityError>> {
    let bytes = signature.as_bytes();
    let v = match bytes[64] {
        27 | 28 => bytes[64] - 27,
        0 | 1 => bytes[64],
        other => {
            return Err(IdentityError::InvalidSignature {
                reason: format!("unsupported recovery byte {other}"),
            }
            .into());
        }
    };
    let recovery_id = RecoveryId::from_byte(v).ok_or_else(|| IdentityError::InvalidSignature {
        reason: format!("unsupported recovery byte {v}"),
    })?;
    let sig = Signature::from_slice(&bytes[..64]).map_err(|e| IdentityError::InvalidSignature {
        reason: e.to_string(),
    })?;

    let digest = personal_message_hash(message);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id).map_err(|e| {
        IdentityError::InvalidSignature {
            reason: e.to_string(),
        }
    })?;
    Ok(WalletAddress::from_verifying_key(&key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_matches_eip55_vector() {
        let addr: WalletAddress = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
            .parse()
            .expect("parse");
        assert_eq!(
            addr.to_checksum(),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let result: Result<WalletAddress, _> = "0x1234".parse();
        assert!(matches!(
            result,
            Err(IdentityError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn serde_uses_checksum_string() {
        let addr: WalletAddress = "5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
            .parse()
            .expect("parse");
        let json = serde_json::to_string(&addr).expect("serialize");
        assert_eq!(json, "\"0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed\"");
        let back: WalletAddress = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, addr);
    }

    #[test]
    fn recover_rejects_bad_recovery_byte() {
        let mut bytes = [1u8; 65];
        bytes[64] = 99;
        let result = recover_signer(b"hello", &IdentitySignature::from_bytes(bytes));
        assert!(result.is_err());
    }
}
