//! Serve command implementation.

use crate::error::CliResult;
use notepeer_server::{ServerConfig, SyncServer};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::{info, warn};

/// Options for the serve command.
#[derive(Debug)]
pub struct ServeOptions {
    /// Address to bind.
    pub bind: IpAddr,
    /// Port to listen on.
    pub port: u16,
    /// Vault directory for pushed notes.
    pub vault: Option<PathBuf>,
    /// Note file extension.
    pub extension: String,
    /// Connection limit.
    pub max_connections: usize,
}

impl ServeOptions {
    fn to_config(&self) -> ServerConfig {
        let mut config = ServerConfig::new(SocketAddr::new(self.bind, self.port))
            .with_note_extension(self.extension.as_str())
            .with_max_connections(self.max_connections);
        if let Some(vault) = &self.vault {
            config = config.with_vault_dir(vault);
        }
        config
    }
}

/// Runs the serve command until Ctrl-C.
pub async fn run(options: ServeOptions) -> CliResult<()> {
    match &options.vault {
        Some(vault) if !vault.is_dir() => {
            warn!(vault = %vault.display(), "vault directory does not exist; pushes will fail");
        }
        Some(_) => {}
        None => info!("no vault configured; push-note requests will be refused"),
    }

    let bound = SyncServer::new(options.to_config()).listen().await?;
    println!("Listening on ws://{}", bound.local_addr());

    bound.serve_with_shutdown(shutdown_signal()).await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl-C, shutting down"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
