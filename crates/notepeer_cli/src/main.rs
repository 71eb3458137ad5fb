//! notepeer CLI
//!
//! Runs a note sync server or talks to one.
//!
//! # Commands
//!
//! - `serve` - Run a sync server with an in-memory registry
//! - `get` / `register` / `push` / `delete` / `list` - One request to a peer
//! - `fetch` - Fetch a note by share link, optionally into a local file
//! - `resolve` - Fold offers from several peers into the local copy

mod commands;
mod error;
mod prompt;

use clap::{Args, Parser, Subcommand, ValueEnum};
use notepeer_client::{ClientConfig, PeerClient};
use notepeer_protocol::{ServerAddress, ShareKey, DEFAULT_PORT};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Peer-to-peer note sync over WebSocket.
#[derive(Parser)]
#[command(name = "notepeer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Seconds to wait for a peer before giving up
    #[arg(global = true, long, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a sync server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: IpAddr,

        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Vault directory that pushed notes are written into
        #[arg(long)]
        vault: Option<PathBuf>,

        /// Extension of note files in the vault
        #[arg(long, default_value = "md")]
        extension: String,

        /// Maximum number of concurrent connections
        #[arg(long, default_value_t = 256)]
        max_connections: usize,
    },

    /// Print a note held by a peer
    Get {
        /// Peer address (host, host:port or ws:// URL)
        peer: ServerAddress,
        /// Note key
        key: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Register a note in a peer's registry
    Register {
        /// Peer address
        peer: ServerAddress,
        /// Note key
        key: String,
        #[command(flatten)]
        body: ContentArgs,
    },

    /// Register a note and write it into the peer's vault
    Push {
        /// Peer address
        peer: ServerAddress,
        /// Note key
        key: String,
        #[command(flatten)]
        body: ContentArgs,
    },

    /// Remove a note from a peer's registry
    Delete {
        /// Peer address
        peer: ServerAddress,
        /// Note key
        key: String,
    },

    /// List the keys registered on a peer
    List {
        /// Peer address
        peer: ServerAddress,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Fetch a note by share link (scheme://host:port/note/key)
    Fetch {
        /// Share link
        share: ShareKey,
        /// Write into this file after confirming instead of printing
        #[arg(long)]
        into: Option<PathBuf>,
    },

    /// Resolve a note against offers from other peers
    Resolve {
        /// Note key
        key: String,
        /// Server holding the copy to resolve into
        #[arg(long, default_value = "127.0.0.1")]
        local: ServerAddress,
        /// Peers to gather offers from, asked in order
        #[arg(long = "peer", required = true)]
        peers: Vec<ServerAddress>,
    },

    /// Show version information
    Version,
}

/// Where note content comes from.
#[derive(Args, Debug, Default)]
pub struct ContentArgs {
    /// Read the content from this file
    #[arg(long, conflicts_with = "content")]
    file: Option<PathBuf>,

    /// Use this text as the content
    #[arg(long)]
    content: Option<String>,
}

/// Output format for commands that print data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; note content goes to stdout, logs to stderr.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let client = PeerClient::new(ClientConfig::new().with_timeout(Duration::from_secs(cli.timeout)));

    match cli.command {
        Commands::Serve {
            bind,
            port,
            vault,
            extension,
            max_connections,
        } => {
            commands::serve::run(
                commands::serve::ServeOptions {
                    bind,
                    port,
                    vault,
                    extension,
                    max_connections,
                },
            )
            .await?;
        }
        Commands::Get { peer, key, format } => {
            commands::notes::get(&client, &peer, &key, format).await?;
        }
        Commands::Register { peer, key, body } => {
            let content = body.read()?;
            commands::notes::register(&client, &peer, &key, &content).await?;
        }
        Commands::Push { peer, key, body } => {
            let content = body.read()?;
            commands::notes::push(&client, &peer, &key, &content).await?;
        }
        Commands::Delete { peer, key } => {
            commands::notes::delete(&client, &peer, &key).await?;
        }
        Commands::List { peer, format } => {
            commands::notes::list(&client, &peer, format).await?;
        }
        Commands::Fetch { share, into } => {
            commands::fetch::run(&client, &share, into.as_deref()).await?;
        }
        Commands::Resolve { key, local, peers } => {
            commands::resolve::run(&client, &local, &peers, &key).await?;
        }
        Commands::Version => {
            println!("notepeer v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
