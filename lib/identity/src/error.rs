//! Error types for the identity crate.

use std::fmt;

/// Errors from credential and signature handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The secret is not a valid 32-byte secp256k1 scalar.
    MalformedSecret { reason: String },
    /// The persisted key file could not be read.
    KeyFileUnreadable { path: String, reason: String },
    /// The generated key could not be written to the key file.
    KeyFileWrite { path: String, reason: String },
    /// Signing a message failed.
    SigningFailed { reason: String },
    /// A signature could not be decoded or did not recover a key.
    InvalidSignature { reason: String },
    /// A wallet address string could not be parsed.
    InvalidAddress { input: String, reason: String },
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedSecret { reason } => write!(f, "malformed secret key: {reason}"),
            Self::KeyFileUnreadable { path, reason } => {
                write!(f, "cannot read key file '{path}': {reason}")
            }
            Self::KeyFileWrite { path, reason } => {
                write!(f, "cannot write key file '{path}': {reason}")
            }
            Self::SigningFailed { reason } => write!(f, "signing failed: {reason}"),
            Self::InvalidSignature { reason } => write!(f, "invalid signature: {reason}"),
            Self::InvalidAddress { input, reason } => {
                write!(f, "invalid wallet address '{input}': {reason}")
            }
        }
    }
}

impl std::error::Error for IdentityError {}
