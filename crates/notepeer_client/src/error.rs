//! Error types for the peer client.

use notepeer_protocol::{MessageKind, ProtocolError};
use std::time::Duration;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur during a peer exchange.
///
/// Nothing is retried internally; every error reaches the caller.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Socket-level failure: refused, reset, DNS, or closed before a reply.
    #[error("connection error: {0}")]
    Connection(String),

    /// The peer answered with an `error` message.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The reply could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The reply was well-formed but of the wrong kind.
    #[error("unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        /// Kind the request should have been answered with.
        expected: MessageKind,
        /// Kind actually received.
        actual: MessageKind,
    },

    /// No reply arrived in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The connection is not open.
    #[error("not connected to peer")]
    NotConnected,

    /// The peer address could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The request could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    /// Returns true if repeating the call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Connection(_) | ClientError::Timeout(_))
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::MalformedMessage(msg) => ClientError::MalformedResponse(msg),
            ProtocolError::InvalidAddress(msg) => ClientError::InvalidAddress(msg),
            ProtocolError::Encode(msg) => ClientError::Protocol(msg),
        }
    }
}
