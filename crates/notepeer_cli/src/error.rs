//! CLI error type.

use notepeer_client::ClientError;
use notepeer_server::ServerError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Talking to a peer failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The local server failed.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The peer does not hold the note.
    #[error("note '{key}' not found on {peer}")]
    NoteNotFound {
        /// Note key.
        key: String,
        /// Peer that was asked.
        peer: String,
    },

    /// Reading or writing a local file failed.
    #[error("{}: {source}", path.display())]
    File {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Rendering JSON output failed.
    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}
