//! # notepeer Sync Server
//!
//! In-memory note registry and WebSocket sync server.
//!
//! This crate provides:
//! - [`NoteRegistry`], the key → content store owned by one server
//! - [`RequestHandler`], the per-message dispatcher
//! - Vault writing for `push-note` with the filename-guessing policy
//! - [`SyncServer`], the TCP/WebSocket accept loop
//!
//! # Architecture
//!
//! Every accepted connection runs in its own task and processes its frames
//! strictly in arrival order: decode, dispatch, respond. All connections
//! share one registry instance, injected at construction, so independent
//! servers can coexist in one process.
//!
//! ```rust,ignore
//! use notepeer_server::{ServerConfig, SyncServer};
//!
//! let config = ServerConfig::default().with_vault_dir("/home/me/vault");
//! let bound = SyncServer::new(config).listen().await?;
//! bound.serve_with_shutdown(shutdown_signal()).await?;
//! ```
//!
//! # Failure isolation
//!
//! A failing message never takes down its connection or the process: the
//! error becomes an `error` response for that message alone.

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod connection;
mod error;
mod handler;
mod registry;
mod server;
mod vault;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler};
pub use registry::{NoteRegistry, RegistryChange, RegistryObserver};
pub use server::{BoundServer, SyncServer};
pub use vault::{candidate_file_names, write_note, FsVault, MemoryVault, VaultStore};
