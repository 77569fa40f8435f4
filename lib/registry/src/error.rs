//! Error types for the registry crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `RegistryError`: Errors writing the snapshot
//! - `ProvisionError`: Errors resolving a key to a conversation

use pagechat_core::ConversationId;
use std::fmt;

/// Errors from registry persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The mapping could not be serialized.
    SerializeFailed { reason: String },
    /// The snapshot file could not be written.
    WriteFailed { path: String, reason: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerializeFailed { reason } => {
                write!(f, "failed to serialize registry: {reason}")
            }
            Self::WriteFailed { path, reason } => {
                write!(f, "failed to write registry snapshot '{path}': {reason}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Errors from conversation provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    /// The key has no conversation yet.
    NotProvisioned { key: String },
    /// The registry names a conversation the network does not know.
    UnknownConversation { key: String, id: ConversationId },
    /// Creating the conversation failed.
    CreateFailed { key: String, details: String },
    /// Looking up the conversation failed.
    LookupFailed { key: String, details: String },
    /// Sending a message failed.
    SendFailed { id: ConversationId, details: String },
    /// Listing messages failed.
    ListFailed { id: ConversationId, details: String },
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotProvisioned { key } => {
                write!(f, "no conversation has been created for '{key}'")
            }
            Self::UnknownConversation { key, id } => {
                write!(f, "conversation {id} registered for '{key}' does not exist")
            }
            Self::CreateFailed { key, details } => {
                write!(f, "failed to create conversation for '{key}': {details}")
            }
            Self::LookupFailed { key, details } => {
                write!(f, "failed to look up conversation for '{key}': {details}")
            }
            Self::SendFailed { id, details } => {
                write!(f, "failed to send to conversation {id}: {details}")
            }
            Self::ListFailed { id, details } => {
                write!(f, "failed to list messages of conversation {id}: {details}")
            }
        }
    }
}

impl std::error::Error for ProvisionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_provisioned_names_key() {
        let err = ProvisionError::NotProvisioned {
            key: "https://example.com/post".to_string(),
        };
        assert!(err.to_string().contains("https://example.com/post"));
    }

    #[test]
    fn unknown_conversation_names_both() {
        let err = ProvisionError::UnknownConversation {
            key: "k".to_string(),
            id: ConversationId::new("c9"),
        };
        let text = err.to_string();
        assert!(text.contains("c9"));
        assert!(text.contains("'k'"));
    }
}
