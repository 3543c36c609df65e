//! Client error types.

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, or a generic message when it was empty.
        message: String,
    },

    /// Session creation succeeded at the HTTP level but carried no id.
    #[error("server did not return a session id")]
    MissingSessionId,

    /// A tool call or listener start was attempted without a session.
    #[error("No active session")]
    NoActiveSession,

    /// A session id that cannot name a single path segment.
    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),

    /// The event stream handshake was rejected.
    #[error("event stream connection failed: HTTP {status}")]
    Handshake {
        /// HTTP status code returned by the stream endpoint.
        status: u16,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stream error.
    #[error("Stream error: {0}")]
    Stream(String),
}

impl Error {
    /// Check if this is the "no active session" precondition failure.
    pub fn is_no_session(&self) -> bool {
        matches!(self, Error::NoActiveSession)
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
