//! Wallet-derived identity for the pagechat relay.
//!
//! This crate provides:
//!
//! - **Credential**: the secp256k1 signing key the relay acts as
//! - **Wallet address**: EIP-55 checksummed address derived from the key
//! - **Key store**: selecting a configured secret or persisting a generated one

pub mod address;
pub mod credential;
pub mod error;
pub mod keystore;

pub use address::{IdentitySignature, WalletAddress, recover_signer};
pub use credential::Credential;
pub use error::IdentityError;
pub use keystore::{CredentialSource, ObtainedCredential, obtain_credential};
