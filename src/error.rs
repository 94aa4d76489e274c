//! Error types for the Quarry client.

use thiserror::Error;

/// Errors that can occur when dispatching a request.
///
/// Every network or protocol failure surfaces as exactly one of these
/// variants; nothing is swallowed. Only [`ClientError::Connection`] ever
/// triggers the bounded host-failover loop; everything else is returned
/// to the caller as-is.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid or contradictory settings. Fatal, never retried.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Name resolution failed, connection refused, or connection reset.
    ///
    /// When more than one host is configured and the call did not pin a
    /// host, this rotates the failover cursor before surfacing.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The exchange exceeded the configured timeout, in milliseconds.
    /// Surfaced directly; a timeout is not a failover trigger.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The server answered with a status >= 400. The raw response body is
    /// kept as diagnostic payload.
    #[error("server returned status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The cache backend reported that the resource does not exist.
    /// Normalized to the same shape as an HTTP 404 from the REST
    /// transport so callers never branch on transport identity.
    #[error("resource could not be found")]
    NotFound,

    /// A transport returned a payload that could not be parsed as JSON.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    /// The HTTP status associated with this error, when one exists.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::HttpStatus { status, .. } => Some(*status),
            ClientError::NotFound => Some(404),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
