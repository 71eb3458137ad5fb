//! Main sync server.

use crate::config::ServerConfig;
use crate::connection::serve_connection;
use crate::error::{ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler};
use crate::registry::NoteRegistry;
use crate::vault::{FsVault, VaultStore};
use notepeer_protocol::{Message, MessageKind};
use std::future::Future;
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// The sync server.
///
/// Owns one [`NoteRegistry`] and answers protocol messages against it.
/// Message handling is synchronous; [`SyncServer::listen`] puts it behind a
/// WebSocket listener.
///
/// # Example
///
/// ```
/// use notepeer_protocol::Message;
/// use notepeer_server::{ServerConfig, SyncServer};
///
/// let server = SyncServer::new(ServerConfig::default());
/// server.handle_message(Message::register_note("test", "hello"));
///
/// let reply = server.handle_message(Message::note_request("test"));
/// assert_eq!(reply, Message::note_content("hello"));
/// ```
pub struct SyncServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl SyncServer {
    /// Creates a new sync server with an empty registry.
    ///
    /// If the configuration names a vault directory, pushed notes are
    /// written there.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registry(config, Arc::new(NoteRegistry::new()))
    }

    /// Creates a sync server around an existing registry.
    pub fn with_registry(config: ServerConfig, registry: Arc<NoteRegistry>) -> Self {
        let vault = config
            .vault_dir
            .as_ref()
            .map(|dir| Arc::new(FsVault::new(dir.clone())) as Arc<dyn VaultStore>);
        Self::with_parts(config, registry, vault)
    }

    /// Creates a sync server from explicit parts.
    pub fn with_parts(
        config: ServerConfig,
        registry: Arc<NoteRegistry>,
        vault: Option<Arc<dyn VaultStore>>,
    ) -> Self {
        let context = Arc::new(HandlerContext::new(config, registry, vault));
        let handler = RequestHandler::new(Arc::clone(&context));

        Self { handler, context }
    }

    /// Returns the registry.
    pub fn registry(&self) -> &Arc<NoteRegistry> {
        &self.context.registry
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Handles a decoded message.
    pub fn handle_message(&self, message: Message) -> Message {
        info!(kind = %message.kind(), key = ?message.key(), "received message");
        match catch_unwind(AssertUnwindSafe(|| self.handler.respond(message))) {
            Ok(response) => response,
            Err(_) => {
                error!("message handler panicked");
                Message::error(ServerError::Internal("handler panicked".into()).to_string())
            }
        }
    }

    /// Handles one text frame and returns the response message.
    pub fn handle_text(&self, text: &str) -> Message {
        match Message::decode(text) {
            Ok(message) => self.handle_message(message),
            Err(e) => {
                warn!(error = %e, "rejecting malformed frame");
                Message::invalid_format()
            }
        }
    }

    /// Handles one text frame from an async context.
    ///
    /// `push-note` writes to the vault, so it runs on the blocking pool;
    /// everything else is answered inline.
    pub async fn dispatch_text(self: &Arc<Self>, text: &str) -> Message {
        let message = match Message::decode(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "rejecting malformed frame");
                return Message::invalid_format();
            }
        };
        if message.kind() != MessageKind::PushNote {
            return self.handle_message(message);
        }

        let server = Arc::clone(self);
        match tokio::task::spawn_blocking(move || server.handle_message(message)).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "push-note task failed");
                Message::error(ServerError::Internal("push-note task failed".into()).to_string())
            }
        }
    }

    /// Binds the configured address.
    pub async fn listen(self) -> ServerResult<BoundServer> {
        let listener = TcpListener::bind(self.context.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "note sync server listening");

        let limiter = Arc::new(Semaphore::new(self.context.config.max_connections));
        Ok(BoundServer {
            listener,
            local_addr,
            limiter,
            server: Arc::new(self),
        })
    }
}

/// A server bound to a socket, ready to accept connections.
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    limiter: Arc<Semaphore>,
    server: Arc<SyncServer>,
}

impl BoundServer {
    /// Returns the address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the server.
    pub fn server(&self) -> &Arc<SyncServer> {
        &self.server
    }

    /// Accepts connections until the process ends.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` completes, then closes every
    /// open connection.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()>,
    {
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "connection task failed");
                    }
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            error!(error = %e, "accept failed");
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            continue;
                        }
                    };

                    let permit = match Arc::clone(&self.limiter).try_acquire_owned() {
                        Ok(permit) => permit,
                        Err(_) => {
                            warn!(%peer, "connection limit reached, refusing connection");
                            drop(stream);
                            continue;
                        }
                    };

                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        Arc::clone(&self.server),
                        permit,
                    ));
                }
            }
        }

        info!(open = connections.len(), "note sync server shutting down");
        connections.shutdown().await;
        Ok(())
    }
}
