//! Error types for the relay.
//!
//! Request errors collapse into two client-facing bodies: a validation
//! message for a missing `url`, and a generic message for everything else.
//! The underlying cause is logged, never returned.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Body returned when the `url` parameter is missing or repeated.
pub const INVALID_URL_MESSAGE: &str = "url query parameter is required and must be a string.";

/// Body returned for every other failure.
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred.";

/// Errors raised while handling a request.
#[derive(Debug)]
pub enum RelayError {
    /// `url` is absent or given more than once.
    InvalidUrl,
    /// Other query parameters are malformed.
    InvalidQuery { details: String },
    /// Resolving the conversation or talking to the network failed.
    Backend { details: String },
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl => write!(f, "missing or non-string url parameter"),
            Self::InvalidQuery { details } => write!(f, "invalid query: {details}"),
            Self::Backend { details } => write!(f, "backend error: {details}"),
        }
    }
}

impl std::error::Error for RelayError {}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::InvalidUrl => INVALID_URL_MESSAGE,
            Self::InvalidQuery { details } => {
                tracing::warn!(details = %details, "Rejected malformed query");
                UNEXPECTED_MESSAGE
            }
            Self::Backend { details } => {
                tracing::error!(details = %details, "Request failed");
                UNEXPECTED_MESSAGE
            }
        };

        (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
    }
}

/// Errors that stop the relay from starting.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// The signing credential could not be obtained.
    Credential { details: String },
    /// The messaging session could not be opened or registered.
    Session { details: String },
    /// TLS material could not be loaded.
    Tls { path: String, details: String },
    /// The listener failed.
    Serve { details: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::Credential { details } => write!(f, "cannot obtain signing key: {details}"),
            Self::Session { details } => write!(f, "cannot establish session: {details}"),
            Self::Tls { path, details } => {
                write!(f, "cannot load TLS material '{path}': {details}")
            }
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for StartupError {}
