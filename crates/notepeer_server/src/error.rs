//! Error types for the sync server.

use notepeer_protocol::ProtocolError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The request is well-formed JSON but not something the server answers.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// `push-note` arrived but this server has no vault to write into.
    #[error("no vault configured for push-note")]
    VaultUnavailable,

    /// Writing a pushed note to the vault failed.
    #[error("failed to write note file {}: {source}", path.display())]
    FileWrite {
        /// Path that was being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// No file name could be derived from the key.
    #[error("no usable file name for note key {0:?}")]
    UnusableKey(String),

    /// Protocol error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Returns true if the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidRequest(_) | ServerError::UnusableKey(_) | ServerError::Protocol(_)
        )
    }

    /// Returns true if the server failed to carry out a valid request.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            ServerError::VaultUnavailable
                | ServerError::FileWrite { .. }
                | ServerError::Internal(_)
                | ServerError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServerError::InvalidRequest("bad".into()).is_client_error());
        assert!(ServerError::UnusableKey("..".into()).is_client_error());
        assert!(ServerError::VaultUnavailable.is_server_error());
        assert!(ServerError::Internal("oops".into()).is_server_error());
        assert!(!ServerError::InvalidRequest("bad".into()).is_server_error());
    }

    #[test]
    fn file_write_display_names_path() {
        let err = ServerError::FileWrite {
            path: PathBuf::from("/vault/My_Note.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/vault/My_Note.md"));
        assert!(msg.contains("denied"));
    }
}
