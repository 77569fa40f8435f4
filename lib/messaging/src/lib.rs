//! Messaging network client for pagechat.
//!
//! This crate provides:
//!
//! - **Session traits**: the seam between the relay and a messaging network
//! - **Registration**: idempotent identity registration for a session
//! - **Local network**: an in-process backend persisted under the identity cache

pub mod error;
pub mod local;
pub mod message;
pub mod registration;
pub mod session;

pub use error::{ConversationError, SendError, SessionError};
pub use local::LocalNetwork;
pub use message::Message;
pub use registration::{RegistrationOutcome, ensure_registered};
pub use session::{
    ConversationHandle, MessagingBackend, MessagingSession, NetworkEnv, SessionOptions,
};
