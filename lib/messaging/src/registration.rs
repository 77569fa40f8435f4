//! Idempotent identity registration.

use crate::error::SessionError;
use crate::session::MessagingSession;
use pagechat_identity::Credential;
use rootcause::Report;
use tracing::{debug, info};

/// What [`ensure_registered`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The identity was already registered; nothing was submitted.
    AlreadyRegistered,
    /// A signed registration was submitted and accepted.
    Registered,
}

/// Registers the session's identity unless it already is.
///
/// Signs the session's challenge text with `credential` using
/// `personal_sign` semantics and submits the signature.
///
/// # Errors
///
/// Returns [`SessionError::MalformedIdentity`] if the credential does not
/// belong to the session, or the backend's error if the registration
/// state cannot be read or the signature is refused.
pub async fn ensure_registered(
    session: &dyn MessagingSession,
    credential: &Credential,
) -> Result<RegistrationOutcome, Report<SessionError>> {
    if session.address() != credential.address() {
        return Err(SessionError::MalformedIdentity {
            reason: format!(
                "session opened for {} but credential is {}",
                session.address(),
                credential.address()
            ),
        }
        .into());
    }

    if session.is_registered().await? {
        debug!(inbox_id = %session.inbox_id(), "Identity already registered");
        return Ok(RegistrationOutcome::AlreadyRegistered);
    }

    let text = session.signature_text();
    let signature =
        credential
            .sign_message(text.as_bytes())
            .map_err(|e| SessionError::RegistrationRejected {
                reason: e.to_string(),
            })?;
    session.register_identity(signature).await?;

    info!(
        inbox_id = %session.inbox_id(),
        address = %credential.address(),
        "Registered identity"
    );
    Ok(RegistrationOutcome::Registered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalNetwork;
    use crate::session::{MessagingBackend, NetworkEnv, SessionOptions};

    #[tokio::test]
    async fn registers_once_then_noops() {
        let dir = tempfile::tempdir().expect("tempdir");
        let credential = Credential::generate();
        let options = SessionOptions::new(NetworkEnv::Local, dir.path());
        let session = LocalNetwork::new()
            .open_session(credential.address(), &options)
            .await
            .expect("open");

        let first = ensure_registered(session.as_ref(), &credential)
            .await
            .expect("register");
        let second = ensure_registered(session.as_ref(), &credential)
            .await
            .expect("register again");

        assert_eq!(first, RegistrationOutcome::Registered);
        assert_eq!(second, RegistrationOutcome::AlreadyRegistered);
        assert!(session.is_registered().await.expect("state"));
    }

    #[tokio::test]
    async fn rejects_foreign_credential() {
        let dir = tempfile::tempdir().expect("tempdir");
        let owner = Credential::generate();
        let stranger = Credential::generate();
        let options = SessionOptions::new(NetworkEnv::Local, dir.path());
        let session = LocalNetwork::new()
            .open_session(owner.address(), &options)
            .await
            .expect("open");

        let result = ensure_registered(session.as_ref(), &stranger).await;

        assert!(result.is_err());
        assert!(!session.is_registered().await.expect("state"));
    }
}
