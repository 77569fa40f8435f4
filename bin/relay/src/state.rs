//! Process-wide relay state.
//!
//! The session is opened and registered once at startup and shared by
//! every request.

use crate::config::RelayConfig;
use crate::error::StartupError;
use pagechat_identity::{Credential, obtain_credential};
use pagechat_messaging::{MessagingBackend, MessagingSession, SessionOptions, ensure_registered};
use pagechat_registry::{ConversationProvisioner, DurableRegistry};
use rootcause::Report;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    /// Registered session for the relay's identity.
    pub session: Arc<dyn MessagingSession>,
    /// Key to conversation resolution.
    pub provisioner: ConversationProvisioner,
}

impl AppState {
    /// Creates application state from its parts.
    pub fn new(session: Arc<dyn MessagingSession>, registry: Arc<DurableRegistry>) -> Self {
        Self {
            session,
            provisioner: ConversationProvisioner::new(registry),
        }
    }

    /// Obtains the credential, opens and registers a session on `backend`,
    /// and loads the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential is malformed or the session cannot
    /// be opened or registered.
    pub async fn initialize(
        config: &RelayConfig,
        backend: &dyn MessagingBackend,
    ) -> Result<Self, Report<StartupError>> {
        let obtained =
            obtain_credential(config.key.as_deref(), &config.key_file_path()).map_err(|e| {
                StartupError::Credential {
                    details: e.to_string(),
                }
            })?;
        let session = open_registered_session(config, backend, &obtained.credential).await?;

        let registry = Arc::new(DurableRegistry::load(&config.storage_path));
        Ok(Self::new(session, registry))
    }
}

async fn open_registered_session(
    config: &RelayConfig,
    backend: &dyn MessagingBackend,
    credential: &Credential,
) -> Result<Arc<dyn MessagingSession>, Report<StartupError>> {
    let options = SessionOptions::new(config.network_env, &config.cache_dir);
    let session = backend
        .open_session(credential.address(), &options)
        .await
        .map_err(|e| StartupError::Session {
            details: e.to_string(),
        })?;
    tracing::info!(
        inbox_id = %session.inbox_id(),
        address = %credential.address(),
        env = %config.network_env,
        "Session established"
    );

    ensure_registered(session.as_ref(), credential)
        .await
        .map_err(|e| StartupError::Session {
            details: e.to_string(),
        })?;
    Ok(session)
}
