//! Resolving registry keys to live conversations.
//!
//! Lookup-or-create runs under a per-key lock, so concurrent first uses
//! of a key create exactly one conversation. A registry entry naming a
//! conversation the network no longer knows is reported, never replaced.

use crate::error::ProvisionError;
use crate::store::DurableRegistry;
use pagechat_core::{ConversationId, MessageId};
use pagechat_messaging::{ConversationHandle, Message, MessagingSession};
use rootcause::Report;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Maps registry keys to conversations, creating them on first use.
#[derive(Debug)]
pub struct ConversationProvisioner {
    registry: Arc<DurableRegistry>,
    key_locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ConversationProvisioner {
    /// Creates a provisioner over `registry`.
    #[must_use]
    pub fn new(registry: Arc<DurableRegistry>) -> Self {
        Self {
            registry,
            key_locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<DurableRegistry> {
        &self.registry
    }

    /// Returns the conversation for `key`, creating and registering one if
    /// the key is new.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::UnknownConversation`] for a stale registry
    /// entry, or a create/lookup error from the network.
    #[instrument(skip(self, session))]
    pub async fn resolve_or_create(
        &self,
        session: &dyn MessagingSession,
        key: &str,
    ) -> Result<ConversationHandle, Report<ProvisionError>> {
        if let Some(id) = self.registry.get(key) {
            return self.fetch(session, key, id).await;
        }

        let lock = self.key_lock(key);
        let result = {
            let _guard = lock.lock().await;
            match self.registry.get(key) {
                // Another request created it while we waited.
                Some(id) => self.fetch(session, key, id).await,
                None => self.create(session, key).await,
            }
        };
        self.release_key_lock(key, lock);
        result
    }

    /// Returns the conversation for `key` without creating one.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::NotProvisioned`] if the key has no entry,
    /// and otherwise the same errors as [`Self::resolve_or_create`].
    #[instrument(skip(self, session))]
    pub async fn resolve_existing(
        &self,
        session: &dyn MessagingSession,
        key: &str,
    ) -> Result<ConversationHandle, Report<ProvisionError>> {
        let Some(id) = self.registry.get(key) else {
            return Err(ProvisionError::NotProvisioned {
                key: key.to_string(),
            }
            .into());
        };
        self.fetch(session, key, id).await
    }

    /// Appends `text` to the conversation.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::SendFailed`] if the network rejects it.
    pub async fn send_message(
        &self,
        session: &dyn MessagingSession,
        handle: &ConversationHandle,
        text: &str,
    ) -> Result<MessageId, Report<ProvisionError>> {
        session.send(handle, text).await.map_err(|e| {
            ProvisionError::SendFailed {
                id: handle.id.clone(),
                details: e.to_string(),
            }
            .into()
        })
    }

    /// Returns the conversation's message history at call time.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::ListFailed`] if the network lookup fails.
    pub async fn list_messages(
        &self,
        session: &dyn MessagingSession,
        handle: &ConversationHandle,
    ) -> Result<Vec<Message>, Report<ProvisionError>> {
        session.messages(handle).await.map_err(|e| {
            ProvisionError::ListFailed {
                id: handle.id.clone(),
                details: e.to_string(),
            }
            .into()
        })
    }

    async fn fetch(
        &self,
        session: &dyn MessagingSession,
        key: &str,
        id: ConversationId,
    ) -> Result<ConversationHandle, Report<ProvisionError>> {
        let found = session
            .conversation(&id)
            .await
            .map_err(|e| ProvisionError::LookupFailed {
                key: key.to_string(),
                details: e.to_string(),
            })?;

        found.ok_or_else(|| {
            warn!(key, conversation_id = %id, "Registry entry names an unknown conversation");
            ProvisionError::UnknownConversation {
                key: key.to_string(),
                id,
            }
            .into()
        })
    }

    async fn create(
        &self,
        session: &dyn MessagingSession,
        key: &str,
    ) -> Result<ConversationHandle, Report<ProvisionError>> {
        let handle = session
            .create_conversation(&[])
            .await
            .map_err(|e| ProvisionError::CreateFailed {
                key: key.to_string(),
                details: e.to_string(),
            })?;

        info!(key, conversation_id = %handle.id, "Created conversation");
        self.registry.put(key, handle.id.clone()).await;
        Ok(handle)
    }

    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.key_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Drops the lock entry once no other request holds or awaits it.
    fn release_key_lock(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    fn pending_key_locks(&self) -> usize {
        self.key_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
