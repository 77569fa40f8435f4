//! The `/api/fetch` endpoint.
//!
//! With a non-empty `msg` the text is appended to the conversation already
//! registered for `url`. Without one, the conversation for `url` is
//! resolved (created on first use) and its messages are returned.

use crate::error::RelayError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use pagechat_messaging::Message;
use std::sync::Arc;

/// Body returned after a successful send.
pub const SENT_MESSAGE: &str = "successfully sent message";

/// Validated query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchParams {
    /// Registry key of the conversation.
    pub url: String,
    /// Text to send; `None` requests the message history.
    pub msg: Option<String>,
}

impl FetchParams {
    /// Validates raw query pairs.
    ///
    /// `url` must appear exactly once. An empty `msg` counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidUrl`] for a missing or repeated `url`,
    /// and [`RelayError::InvalidQuery`] for a repeated `msg`.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, RelayError> {
        let mut urls = Vec::new();
        let mut msgs = Vec::new();
        for (name, value) in pairs {
            match name.as_str() {
                "url" => urls.push(value),
                "msg" => msgs.push(value),
                _ => {}
            }
        }

        let url = match <[String; 1]>::try_from(urls) {
            Ok([url]) => url,
            Err(_) => return Err(RelayError::InvalidUrl),
        };
        let msg = match msgs.len() {
            0 => None,
            1 => msgs.pop().filter(|m| !m.is_empty()),
            n => {
                return Err(RelayError::InvalidQuery {
                    details: format!("msg given {n} times"),
                });
            }
        };

        Ok(Self { url, msg })
    }
}

/// Sends a message or returns the history for the `url` conversation.
pub async fn fetch(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, RelayError> {
    let params = FetchParams::from_pairs(pairs)?;

    match params.msg {
        Some(msg) => {
            tracing::info!(url = %params.url, "Received send request");
            send(&state, &params.url, &msg).await?;
            Ok(Json(SENT_MESSAGE).into_response())
        }
        None => {
            tracing::info!(url = %params.url, "Received fetch request");
            let messages = history(&state, &params.url).await?;
            Ok(Json(messages).into_response())
        }
    }
}

async fn send(state: &AppState, url: &str, msg: &str) -> Result<(), RelayError> {
    let session = state.session.as_ref();
    let handle = state
        .provisioner
        .resolve_existing(session, url)
        .await
        .map_err(backend_error)?;
    state
        .provisioner
        .send_message(session, &handle, msg)
        .await
        .map_err(backend_error)?;
    Ok(())
}

async fn history(state: &AppState, url: &str) -> Result<Vec<Message>, RelayError> {
    let session = state.session.as_ref();
    let handle = state
        .provisioner
        .resolve_or_create(session, url)
        .await
        .map_err(backend_error)?;
    state
        .provisioner
        .list_messages(session, &handle)
        .await
        .map_err(backend_error)
}

fn backend_error(e: impl std::fmt::Display) -> RelayError {
    RelayError::Backend {
        details: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn url_only_is_a_fetch() {
        let params = FetchParams::from_pairs(pairs(&[("url", "https://a.example/")]))
            .expect("valid");
        assert_eq!(params.url, "https://a.example/");
        assert_eq!(params.msg, None);
    }

    #[test]
    fn url_and_msg_is_a_send() {
        let params = FetchParams::from_pairs(pairs(&[("msg", "hi"), ("url", "k")]))
            .expect("valid");
        assert_eq!(params.msg.as_deref(), Some("hi"));
    }

    #[test]
    fn empty_msg_is_a_fetch() {
        let params = FetchParams::from_pairs(pairs(&[("url", "k"), ("msg", "")])).expect("valid");
        assert_eq!(params.msg, None);
    }

    #[test]
    fn missing_url_is_rejected() {
        let result = FetchParams::from_pairs(pairs(&[("msg", "hi")]));
        assert!(matches!(result, Err(RelayError::InvalidUrl)));
    }

    #[test]
    fn repeated_url_is_rejected() {
        let result = FetchParams::from_pairs(pairs(&[("url", "a"), ("url", "b")]));
        assert!(matches!(result, Err(RelayError::InvalidUrl)));
    }

    #[test]
    fn repeated_msg_is_rejected() {
        let result = FetchParams::from_pairs(pairs(&[("url", "a"), ("msg", "x"), ("msg", "y")]));
        assert!(matches!(result, Err(RelayError::InvalidQuery { .. })));
    }
}
