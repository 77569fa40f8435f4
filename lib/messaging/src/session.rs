//! The seam between the relay and a messaging network.
//!
//! A [`MessagingBackend`] opens a [`MessagingSession`] for one wallet
//! identity. Sessions are long-lived and shared across requests.

use crate::error::{ConversationError, SendError, SessionError};
use crate::message::Message;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagechat_core::{ConversationId, InboxId, MessageId};
use pagechat_identity::{IdentitySignature, WalletAddress};
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Which network environment a session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkEnv {
    /// Development network.
    #[default]
    Dev,
    /// Production network.
    Production,
    /// Local-only network.
    Local,
}

impl NetworkEnv {
    /// Returns the environment name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Production => "production",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for NetworkEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for opening a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Network environment.
    pub env: NetworkEnv,
    /// Root directory for per-identity session state.
    pub cache_dir: PathBuf,
}

impl SessionOptions {
    /// Creates options for an environment and cache directory.
    #[must_use]
    pub fn new(env: NetworkEnv, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            env,
            cache_dir: cache_dir.into(),
        }
    }

    /// Returns the directory holding session state for `address`.
    #[must_use]
    pub fn identity_dir(&self, address: &WalletAddress) -> PathBuf {
        self.cache_dir.join(format!("{address}-{}", self.env))
    }
}

/// A live conversation on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHandle {
    /// Conversation identifier.
    pub id: ConversationId,
    /// When the conversation was created.
    pub created_at: DateTime<Utc>,
}

/// Opens sessions against a messaging network.
#[async_trait]
pub trait MessagingBackend: Send + Sync {
    /// Opens a session for `address`, keeping local state under
    /// [`SessionOptions::identity_dir`].
    async fn open_session(
        &self,
        address: WalletAddress,
        options: &SessionOptions,
    ) -> Result<Arc<dyn MessagingSession>, Report<SessionError>>;
}

/// An authenticated handle to the network bound to one identity.
///
/// Conversation operations are rejected until the identity is registered.
#[async_trait]
pub trait MessagingSession: Send + Sync {
    /// The inbox this session acts as.
    fn inbox_id(&self) -> &InboxId;

    /// The wallet address the session was opened for.
    fn address(&self) -> WalletAddress;

    /// The challenge text to sign for registration.
    fn signature_text(&self) -> String;

    /// Returns true if the identity is registered on the network.
    async fn is_registered(&self) -> Result<bool, Report<SessionError>>;

    /// Submits a signature over [`Self::signature_text`] to register.
    async fn register_identity(
        &self,
        signature: IdentitySignature,
    ) -> Result<(), Report<SessionError>>;

    /// Creates a group conversation. The session's own inbox is always a
    /// member; `members` lists any others.
    async fn create_conversation(
        &self,
        members: &[InboxId],
    ) -> Result<ConversationHandle, Report<ConversationError>>;

    /// Looks up a conversation by id. `Ok(None)` means the network does not
    /// know the id.
    async fn conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<ConversationHandle>, Report<ConversationError>>;

    /// Appends a text message.
    async fn send(
        &self,
        conversation: &ConversationHandle,
        text: &str,
    ) -> Result<MessageId, Report<SendError>>;

    /// Returns the full message history at call time, oldest first.
    async fn messages(
        &self,
        conversation: &ConversationHandle,
    ) -> Result<Vec<Message>, Report<ConversationError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_dir_combines_address_and_env() {
        let address: WalletAddress = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
            .parse()
            .expect("address");
        let options = SessionOptions::new(NetworkEnv::Dev, ".cache");

        assert_eq!(
            options.identity_dir(&address),
            PathBuf::from(".cache/0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed-dev")
        );
    }

    #[test]
    fn network_env_parses_snake_case() {
        let env: NetworkEnv = serde_json::from_str("\"production\"").expect("deserialize");
        assert_eq!(env, NetworkEnv::Production);
        assert_eq!(NetworkEnv::default(), NetworkEnv::Dev);
    }
}
