//! Client error types.

use thiserror::Error;

use crate::http::ExpectedStatus;

/// Maximum number of body bytes kept in a [`Error::Decode`] snippet.
pub const DECODE_SNIPPET_LIMIT: usize = 256;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The round trip failed before a response was received.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// URL parsing failed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header name or value could not be encoded.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The server answered with a status the caller did not accept.
    #[error("unexpected status code: {actual} (expected {expected})")]
    StatusMismatch {
        /// Status codes the caller accepts.
        expected: ExpectedStatus,
        /// Status code the server returned.
        actual: u16,
        /// Raw response body, for diagnostics.
        body: String,
    },

    /// The response body did not parse as the requested shape.
    #[error("failed to decode {format} response: {reason} (body: {snippet:?})")]
    Decode {
        /// Decoder that was used (`json`, `xml`).
        format: &'static str,
        /// Underlying parser message.
        reason: String,
        /// Bounded prefix of the raw body.
        snippet: String,
    },

    /// Crumb issuance failed while running in strict crumb mode.
    #[error("crumb issuance failed: {0}")]
    Crumb(String),

    /// Reading a local file (upload, file parameter) failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing a request payload failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The server answered successfully but the content is unusable.
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(Box::new(err))
    }
}

impl Error {
    /// Build a transport error from any error or message.
    pub fn transport(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Transport(err.into())
    }

    /// Build a decode error, keeping a bounded prefix of the body.
    pub(crate) fn decode(format: &'static str, reason: impl ToString, body: &[u8]) -> Self {
        Error::Decode {
            format,
            reason: reason.to_string(),
            snippet: snippet(body),
        }
    }

    /// The actual status code when this is a status mismatch.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::StatusMismatch { actual, .. } => Some(*actual),
            _ => None,
        }
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(status) if status >= 500)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Lossy UTF-8 prefix of `body`, at most [`DECODE_SNIPPET_LIMIT`] bytes.
fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= DECODE_SNIPPET_LIMIT {
        return text.into_owned();
    }
    let mut end = DECODE_SNIPPET_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}
