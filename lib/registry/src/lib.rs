//! URL-to-conversation registry for pagechat.
//!
//! This crate provides:
//!
//! - **Durable Registry**: key to conversation id mapping mirrored to a JSON snapshot
//! - **Conversation Provisioner**: resolve-or-create with per-key mutual exclusion

pub mod error;
pub mod provisioner;
pub mod store;

pub use error::{ProvisionError, RegistryError};
pub use provisioner::ConversationProvisioner;
pub use store::DurableRegistry;
