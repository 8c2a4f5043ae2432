//! Error type for WebPilot client operations.
//!
//! Only failures that abort a run before or during transport live here.
//! A remote ERROR event is a failure *outcome*, not a `ClientError`, and a
//! block that fails to decode is skipped where it happens.

use crate::config;

/// Fatal failures of a run's setup or transport.
#[derive(Debug)]
pub enum ClientError {
    /// No API key was configured.
    MissingApiKey,
    /// The HTTP request or a body read failed.
    Http(reqwest::Error),
    /// The API answered with a non-success status.
    ServerError { status: u16, message: String },
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::MissingApiKey => write!(f, "{} not set", config::API_KEY_ENV),
            ClientError::Http(e) => write!(f, "HTTP error: {}", e),
            ClientError::ServerError { status, message } => {
                write!(f, "WebPilot API returned {}: {}", status, message)
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e)
    }
}
