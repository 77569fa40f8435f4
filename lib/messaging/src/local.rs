//! In-process messaging network.
//!
//! `LocalNetwork` keeps each identity's registration, conversations and
//! messages in `network.json` under the identity's cache directory. It
//! enforces the same rules a remote network does: registration needs a
//! valid signature from the identity's key, and every conversation
//! operation needs a registered identity.

use crate::error::{ConversationError, SendError, SessionError};
use crate::message::Message;
use crate::session::{
    ConversationHandle, MessagingBackend, MessagingSession, NetworkEnv, SessionOptions,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagechat_core::{ConversationId, InboxId, MessageId, write_atomic};
use pagechat_identity::{IdentitySignature, WalletAddress, recover_signer};
use rootcause::Report;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use ulid::Ulid;

const STATE_FILE: &str = "network.json";

/// A messaging backend that runs inside the relay process.
#[derive(Debug, Clone, Default)]
pub struct LocalNetwork;

impl LocalNetwork {
    /// Creates a local network backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessagingBackend for LocalNetwork {
    async fn open_session(
        &self,
        address: WalletAddress,
        options: &SessionOptions,
    ) -> Result<Arc<dyn MessagingSession>, Report<SessionError>> {
        let dir = options.identity_dir(&address);
        let state_path = dir.join(STATE_FILE);

        let state = tokio::task::spawn_blocking({
            let state_path = state_path.clone();
            move || load_state(&state_path)
        })
        .await
        .map_err(|e| SessionError::Unreachable {
            reason: e.to_string(),
        })??;

        let inbox_id = derive_inbox_id(&address);
        info!(
            inbox_id = %inbox_id,
            state_path = %state_path.display(),
            conversations = state.conversations.len(),
            "Opened local network session"
        );

        Ok(Arc::new(LocalSession {
            address,
            inbox_id,
            env: options.env,
            state_path,
            state: Mutex::new(state),
        }))
    }
}

fn load_state(path: &std::path::Path) -> Result<NetworkState, Report<SessionError>> {
    let dir = path.parent().unwrap_or(path);
    std::fs::create_dir_all(dir).map_err(|e| SessionError::StorageFailed {
        reason: format!("cannot create {}: {e}", dir.display()),
    })?;

    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            SessionError::StorageFailed {
                reason: format!("cannot parse {}: {e}", path.display()),
            }
            .into()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(NetworkState::default()),
        Err(e) => Err(SessionError::StorageFailed {
            reason: format!("cannot read {}: {e}", path.display()),
        }
        .into()),
    }
}

/// Inbox ids are derived deterministically from the wallet address.
fn derive_inbox_id(address: &WalletAddress) -> InboxId {
    let mut hasher = Keccak256::new();
    hasher.update(b"inbox:");
    hasher.update(address.as_bytes());
    InboxId::new(hex::encode(hasher.finalize()))
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct NetworkState {
    registered: bool,
    conversations: BTreeMap<ConversationId, StoredConversation>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredConversation {
    created_at: DateTime<Utc>,
    members: Vec<InboxId>,
    messages: Vec<Message>,
}

impl StoredConversation {
    fn handle(&self, id: &ConversationId) -> ConversationHandle {
        ConversationHandle {
            id: id.clone(),
            created_at: self.created_at,
        }
    }
}

struct LocalSession {
    address: WalletAddress,
    inbox_id: InboxId,
    env: NetworkEnv,
    state_path: PathBuf,
    state: Mutex<NetworkState>,
}

impl LocalSession {
    /// Writes the state snapshot. Callers hold the state lock, so writes
    /// land in mutation order.
    async fn persist(&self, state: &NetworkState) -> Result<(), String> {
        let bytes = serde_json::to_vec_pretty(state).map_err(|e| e.to_string())?;
        let path = self.state_path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| e.to_string())?
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl MessagingSession for LocalSession {
    fn inbox_id(&self) -> &InboxId {
        &self.inbox_id
    }

    fn address(&self) -> WalletAddress {
        self.address
    }

    fn signature_text(&self) -> String {
        format!(
            "pagechat network ({})\n\nRegister inbox {} for wallet {}",
            self.env, self.inbox_id, self.address
        )
    }

    async fn is_registered(&self) -> Result<bool, Report<SessionError>> {
        Ok(self.state.lock().await.registered)
    }

    async fn register_identity(
        &self,
        signature: IdentitySignature,
    ) -> Result<(), Report<SessionError>> {
        let signer = recover_signer(self.signature_text().as_bytes(), &signature).map_err(|e| {
            SessionError::RegistrationRejected {
                reason: e.to_string(),
            }
        })?;
        if signer != self.address {
            return Err(SessionError::RegistrationRejected {
                reason: format!("signature is from {signer}, expected {}", self.address),
            }
            .into());
        }

        let mut state = self.state.lock().await;
        if state.registered {
            return Ok(());
        }
        state.registered = true;
        if let Err(reason) = self.persist(&state).await {
            state.registered = false;
            return Err(SessionError::StorageFailed { reason }.into());
        }
        Ok(())
    }

    async fn create_conversation(
        &self,
        members: &[InboxId],
    ) -> Result<ConversationHandle, Report<ConversationError>> {
        let mut state = self.state.lock().await;
        if !state.registered {
            return Err(ConversationError::NotRegistered.into());
        }

        let id = ConversationId::new(Ulid::new().to_string().to_lowercase());
        let mut all_members = vec![self.inbox_id.clone()];
        all_members.extend(members.iter().filter(|m| **m != self.inbox_id).cloned());
        let stored = StoredConversation {
            created_at: Utc::now(),
            members: all_members,
            messages: Vec::new(),
        };
        let handle = stored.handle(&id);
        state.conversations.insert(id.clone(), stored);

        if let Err(reason) = self.persist(&state).await {
            state.conversations.remove(&id);
            return Err(ConversationError::StorageFailed { reason }.into());
        }

        debug!(conversation_id = %id, "Created conversation");
        Ok(handle)
    }

    async fn conversation(
        &self,
        id: &ConversationId,
    ) -> Result<Option<ConversationHandle>, Report<ConversationError>> {
        let state = self.state.lock().await;
        if !state.registered {
            return Err(ConversationError::NotRegistered.into());
        }
        Ok(state.conversations.get(id).map(|c| c.handle(id)))
    }

    async fn send(
        &self,
        conversation: &ConversationHandle,
        text: &str,
    ) -> Result<MessageId, Report<SendError>> {
        if text.is_empty() {
            return Err(SendError::Rejected {
                reason: "message is empty".to_string(),
            }
            .into());
        }

        let mut state = self.state.lock().await;
        if !state.registered {
            return Err(SendError::NotRegistered.into());
        }
        let Some(stored) = state.conversations.get_mut(&conversation.id) else {
            return Err(SendError::InvalidConversation {
                id: conversation.id.clone(),
            }
            .into());
        };

        let id = MessageId::new(Ulid::new().to_string().to_lowercase());
        stored.messages.push(Message::new(
            id.clone(),
            conversation.id.clone(),
            self.inbox_id.clone(),
            text,
        ));

        if let Err(reason) = self.persist(&state).await {
            if let Some(stored) = state.conversations.get_mut(&conversation.id) {
                stored.messages.pop();
            }
            return Err(SendError::Rejected { reason }.into());
        }
        Ok(id)
    }

    async fn messages(
        &self,
        conversation: &ConversationHandle,
    ) -> Result<Vec<Message>, Report<ConversationError>> {
        let state = self.state.lock().await;
        if !state.registered {
            return Err(ConversationError::NotRegistered.into());
        }
        state
            .conversations
            .get(&conversation.id)
            .map(|c| c.messages.clone())
            .ok_or_else(|| {
                ConversationError::NotFound {
                    id: conversation.id.clone(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::ensure_registered;
    use pagechat_identity::Credential;

    async fn registered_session(
        dir: &std::path::Path,
        credential: &Credential,
    ) -> Arc<dyn MessagingSession> {
        let options = SessionOptions::new(NetworkEnv::Local, dir);
        let session = LocalNetwork::new()
            .open_session(credential.address(), &options)
            .await
            .expect("open");
        ensure_registered(session.as_ref(), credential)
            .await
            .expect("register");
        session
    }

    #[tokio::test]
    async fn unregistered_session_rejects_conversation_operations() {
        let dir = tempfile::tempdir().expect("tempdir");
        let credential = Credential::generate();
        let options = SessionOptions::new(NetworkEnv::Local, dir.path());
        let session = LocalNetwork::new()
            .open_session(credential.address(), &options)
            .await
            .expect("open");

        let result = session.create_conversation(&[]).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn rejects_signature_from_other_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let owner = Credential::generate();
        let options = SessionOptions::new(NetworkEnv::Local, dir.path());
        let session = LocalNetwork::new()
            .open_session(owner.address(), &options)
            .await
            .expect("open");

        let forged = Credential::generate()
            .sign_message(session.signature_text().as_bytes())
            .expect("sign");
        let result = session.register_identity(forged).await;

        assert!(result.is_err());
        assert!(!session.is_registered().await.expect("state"));
    }

    #[tokio::test]
    async fn send_and_list_messages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let credential = Credential::generate();
        let session = registered_session(dir.path(), &credential).await;

        let handle = session.create_conversation(&[]).await.expect("create");
        assert!(session.messages(&handle).await.expect("list").is_empty());

        session.send(&handle, "first").await.expect("send");
        session.send(&handle, "second").await.expect("send");

        let messages = session.messages(&handle).await.expect("list");
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["first", "second"]);
        assert!(messages.iter().all(|m| m.conversation_id == handle.id));
        assert!(messages.iter().all(|m| &m.sender_inbox_id == session.inbox_id()));
    }

    #[tokio::test]
    async fn unknown_conversation_lookup_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let credential = Credential::generate();
        let session = registered_session(dir.path(), &credential).await;

        let found = session
            .conversation(&ConversationId::new("missing"))
            .await
            .expect("lookup");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn send_to_unknown_conversation_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let credential = Credential::generate();
        let session = registered_session(dir.path(), &credential).await;
        let ghost = ConversationHandle {
            id: ConversationId::new("missing"),
            created_at: Utc::now(),
        };

        assert!(session.send(&ghost, "hello").await.is_err());
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let credential = Credential::generate();
        let session = registered_session(dir.path(), &credential).await;
        let handle = session.create_conversation(&[]).await.expect("create");

        assert!(session.send(&handle, "").await.is_err());
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let credential = Credential::generate();
        let handle = {
            let session = registered_session(dir.path(), &credential).await;
            let handle = session.create_conversation(&[]).await.expect("create");
            session.send(&handle, "persisted").await.expect("send");
            handle
        };

        let options = SessionOptions::new(NetworkEnv::Local, dir.path());
        let reopened = LocalNetwork::new()
            .open_session(credential.address(), &options)
            .await
            .expect("reopen");

        assert!(reopened.is_registered().await.expect("state"));
        let found = reopened
            .conversation(&handle.id)
            .await
            .expect("lookup")
            .expect("conversation exists");
        let messages = reopened.messages(&found).await.expect("list");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "persisted");
    }

    #[tokio::test]
    async fn corrupt_state_fails_to_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let credential = Credential::generate();
        let options = SessionOptions::new(NetworkEnv::Local, dir.path());
        let state_path = options.identity_dir(&credential.address()).join(STATE_FILE);
        std::fs::create_dir_all(state_path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&state_path, b"{not json").expect("seed");

        let result = LocalNetwork::new()
            .open_session(credential.address(), &options)
            .await;

        assert!(result.is_err());
    }
}
