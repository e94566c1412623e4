//! Transport-level error types.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while performing an RDAP lookup.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A server or bootstrap URL could not be built.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client error (connect, TLS, body read).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The lookup did not complete within the configured timeout.
    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Response body is not a valid RDAP JSON document.
    #[error("malformed RDAP payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// No bootstrap service covers the queried domain.
    #[error("no RDAP server found in bootstrap registry for '{0}'")]
    NoBootstrapMatch(String),
}
