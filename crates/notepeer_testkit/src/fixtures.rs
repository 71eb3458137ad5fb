//! Test fixtures: live servers and raw peers.
//!
//! Fixtures panic on setup failure; they are only meant for tests.

use futures_util::{SinkExt, StreamExt};
use notepeer_protocol::{Message, ServerAddress};
use notepeer_server::{NoteRegistry, ServerConfig, ServerResult, SyncServer};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// A sync server listening on `127.0.0.1` with a temporary vault.
///
/// The server shuts down when dropped.
pub struct TestServer {
    addr: SocketAddr,
    registry: Arc<NoteRegistry>,
    vault: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<ServerResult<()>>>,
}

impl TestServer {
    /// Starts a server with default settings on an ephemeral port.
    pub async fn start() -> Self {
        Self::start_with(|config| config).await
    }

    /// Starts a server, letting the caller adjust the configuration.
    ///
    /// The bind address and vault directory are always set by the fixture.
    pub async fn start_with<F>(configure: F) -> Self
    where
        F: FnOnce(ServerConfig) -> ServerConfig,
    {
        let vault = TempDir::new().expect("Failed to create vault directory");
        let config = configure(ServerConfig::new(SocketAddr::from(([127, 0, 0, 1], 0))))
            .with_vault_dir(vault.path());

        let server = SyncServer::new(config);
        let registry = Arc::clone(server.registry());
        let bound = server.listen().await.expect("Failed to bind test server");
        let addr = bound.local_addr();

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(bound.serve_with_shutdown(async {
            let _ = rx.await;
        }));

        Self {
            addr,
            registry,
            vault,
            shutdown: Some(tx),
            task: Some(task),
        }
    }

    /// Returns the address clients should connect to.
    pub fn address(&self) -> ServerAddress {
        ServerAddress::from(self.addr)
    }

    /// Returns the bound socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the server's registry.
    pub fn registry(&self) -> &Arc<NoteRegistry> {
        &self.registry
    }

    /// Returns the vault directory.
    pub fn vault_dir(&self) -> &Path {
        self.vault.path()
    }

    /// Lists the files currently in the vault directory, sorted.
    pub fn vault_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.vault.path())
            .expect("Failed to read vault directory")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Stops the server and waits for it to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await
                .expect("Server task panicked")
                .expect("Server returned an error");
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// A WebSocket endpoint that accepts connections and reads frames but
/// never replies.
pub struct SilentPeer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl SilentPeer {
    /// Starts a silent peer on an ephemeral port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind silent peer");
        let addr = listener.local_addr().expect("Failed to read local address");

        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
                        while let Some(Ok(_)) = ws.next().await {}
                    }
                });
            }
        });

        Self { addr, task }
    }

    /// Returns the address clients should connect to.
    pub fn address(&self) -> ServerAddress {
        ServerAddress::from(self.addr)
    }
}

impl Drop for SilentPeer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A bare WebSocket connection for sending arbitrary frames.
pub struct RawPeer {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl RawPeer {
    /// Connects to `address`.
    pub async fn connect(address: &ServerAddress) -> Self {
        let (ws, _) = tokio_tungstenite::connect_async(address.ws_url().as_str())
            .await
            .expect("Failed to connect raw peer");
        Self { ws }
    }

    /// Sends a text frame as-is.
    pub async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Frame::Text(text.to_string().into()))
            .await
            .expect("Failed to send frame");
    }

    /// Sends a binary frame.
    pub async fn send_binary(&mut self, bytes: Vec<u8>) {
        self.ws
            .send(Frame::Binary(bytes.into()))
            .await
            .expect("Failed to send frame");
    }

    /// Sends an encoded message.
    pub async fn send(&mut self, message: &Message) {
        let text = message.encode().expect("Failed to encode message");
        self.send_text(&text).await;
    }

    /// Receives the next message.
    pub async fn recv(&mut self) -> Message {
        loop {
            match self.ws.next().await {
                Some(Ok(Frame::Text(text))) => {
                    return Message::decode(text.as_str()).expect("Server sent a malformed message")
                }
                Some(Ok(Frame::Ping(_))) | Some(Ok(Frame::Pong(_))) => continue,
                other => panic!("Expected a text frame, got {:?}", other),
            }
        }
    }

    /// Sends `message` and returns the reply.
    pub async fn request(&mut self, message: &Message) -> Message {
        self.send(message).await;
        self.recv().await
    }

    /// Sends a close frame and returns true if the peer answered with one.
    pub async fn close_handshake(mut self) -> bool {
        if self.ws.send(Frame::Close(None)).await.is_err() {
            return false;
        }
        loop {
            match self.ws.next().await {
                Some(Ok(Frame::Close(_))) => return true,
                Some(Ok(_)) => continue,
                _ => return false,
            }
        }
    }

    /// Closes the connection.
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
