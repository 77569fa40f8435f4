//! Error types for the messaging crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `SessionError`: Errors opening or registering a session
//! - `ConversationError`: Errors creating, fetching or listing conversations
//! - `SendError`: Errors appending a message

use pagechat_core::ConversationId;
use std::fmt;

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The network could not be reached.
    Unreachable { reason: String },
    /// The identity does not match what the session expects.
    MalformedIdentity { reason: String },
    /// The network refused the registration signature.
    RegistrationRejected { reason: String },
    /// Session state could not be read or written.
    StorageFailed { reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable { reason } => write!(f, "messaging network unreachable: {reason}"),
            Self::MalformedIdentity { reason } => write!(f, "malformed identity: {reason}"),
            Self::RegistrationRejected { reason } => {
                write!(f, "identity registration rejected: {reason}")
            }
            Self::StorageFailed { reason } => write!(f, "session storage failed: {reason}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Errors from conversation operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// The session has not registered its identity.
    NotRegistered,
    /// No conversation exists with this id.
    NotFound { id: ConversationId },
    /// Storage operation failed.
    StorageFailed { reason: String },
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRegistered => write!(f, "session identity is not registered"),
            Self::NotFound { id } => write!(f, "conversation not found: {id}"),
            Self::StorageFailed { reason } => {
                write!(f, "conversation storage failed: {reason}")
            }
        }
    }
}

impl std::error::Error for ConversationError {}

/// Errors from sending a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The session has not registered its identity.
    NotRegistered,
    /// The conversation handle does not refer to a live conversation.
    InvalidConversation { id: ConversationId },
    /// The network rejected the payload.
    Rejected { reason: String },
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRegistered => write!(f, "session identity is not registered"),
            Self::InvalidConversation { id } => {
                write!(f, "cannot send to unknown conversation {id}")
            }
            Self::Rejected { reason } => write!(f, "message rejected: {reason}"),
        }
    }
}

impl std::error::Error for SendError {}
