//! Server configuration.

use notepeer_protocol::DEFAULT_PORT;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Directory `push-note` writes into. `None` disables pushes.
    pub vault_dir: Option<PathBuf>,
    /// Extension appended to note file names, without the dot.
    pub note_extension: String,
    /// Maximum concurrent connections.
    pub max_connections: usize,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            vault_dir: None,
            note_extension: "md".to_string(),
            max_connections: 256,
        }
    }

    /// Sets the vault directory.
    pub fn with_vault_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.vault_dir = Some(dir.into());
        self
    }

    /// Sets the note file extension.
    pub fn with_note_extension(mut self, extension: impl Into<String>) -> Self {
        self.note_extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Sets the maximum concurrent connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3010);
        assert_eq!(config.note_extension, "md");
        assert!(config.vault_dir.is_none());
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::new("127.0.0.1:9000".parse().unwrap())
            .with_vault_dir("/tmp/vault")
            .with_note_extension(".txt")
            .with_max_connections(8);

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.vault_dir, Some(PathBuf::from("/tmp/vault")));
        assert_eq!(config.note_extension, "txt");
        assert_eq!(config.max_connections, 8);
    }
}
