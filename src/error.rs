//! Request error taxonomy.
//!
//! Every failure a [`Session`](crate::session::Session) can observe is one
//! of these variants. None of them reach the view layer directly: the
//! session converts each into a status message with
//! [`RequestError::status_message`].

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::status::Operation;

#[derive(Debug, Error)]
pub enum RequestError {
    /// Rejected locally; no request was sent.
    #[error("{0}")]
    Validation(String),

    /// No response (connection refused, DNS failure, timeout, ...).
    #[error("request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// Error status without a usable `detail` field.
    #[error("backend returned HTTP {status}")]
    Http { status: StatusCode },

    /// Structured backend error carrying a `detail` message.
    #[error("{detail}")]
    Application { status: StatusCode, detail: String },

    /// The success body did not have the expected shape.
    #[error("unexpected response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    /// A local file could not be read while building the request.
    #[error("could not read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RequestError {
    /// Message to surface in the operation's status slot.
    ///
    /// Validation and application errors are shown verbatim. Transport,
    /// HTTP and decode failures fall back to the operation's fixed wording.
    pub fn status_message(&self, operation: Operation) -> String {
        match self {
            RequestError::Validation(message) => message.clone(),
            RequestError::Application { detail, .. } => detail.clone(),
            RequestError::File { path, source } => {
                format!("Could not read {}: {}", path.display(), source)
            }
            RequestError::Transport { .. }
            | RequestError::Http { .. }
            | RequestError::Decode { .. } => operation.fallback_message().to_string(),
        }
    }

    /// True for failures the backend explicitly reported.
    pub fn is_application(&self) -> bool {
        matches!(self, RequestError::Application { .. })
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(source: reqwest::Error) -> Self {
        RequestError::Transport { source }
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(source: serde_json::Error) -> Self {
        RequestError::Decode { source }
    }
}
