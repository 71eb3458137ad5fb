//! Client-side connection state machine.

use crate::error::{ClientError, ClientResult};
use futures_util::{SinkExt, StreamExt};
use notepeer_protocol::{Message, ServerAddress};
use std::sync::Once;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle of a [`PeerConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, not yet open.
    Connecting,
    /// Open and able to carry a request.
    Open,
    /// Closed by either side or by a transport failure. Terminal.
    Closed,
}

/// One WebSocket connection to a sync server.
///
/// Requests take `&mut self`, so at most one request is in flight and the
/// next frame received is its response.
pub struct PeerConnection {
    address: ServerAddress,
    state: ConnectionState,
    ws: Option<WsStream>,
}

impl PeerConnection {
    /// Creates a connection in the `Connecting` state.
    pub fn new(address: ServerAddress) -> Self {
        Self {
            address,
            state: ConnectionState::Connecting,
            ws: None,
        }
    }

    /// Creates and opens a connection.
    pub async fn connect(address: &ServerAddress) -> ClientResult<Self> {
        let mut connection = Self::new(address.clone());
        connection.open().await?;
        Ok(connection)
    }

    /// Returns the current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the peer address.
    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    /// Opens the socket. Only valid in the `Connecting` state.
    pub async fn open(&mut self) -> ClientResult<()> {
        if self.state != ConnectionState::Connecting {
            return Err(ClientError::NotConnected);
        }

        let url = self.address.ws_url();
        if self.address.secure {
            install_crypto_provider();
        }
        debug!(%url, "connecting to peer");
        match connect_async(url.as_str()).await {
            Ok((ws, _response)) => {
                self.ws = Some(ws);
                self.state = ConnectionState::Open;
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Closed;
                Err(ClientError::Connection(format!("{}: {}", url, e)))
            }
        }
    }

    /// Sends `message` and waits for the next message from the peer.
    pub async fn request(&mut self, message: &Message) -> ClientResult<Message> {
        self.send(message).await?;
        self.receive().await
    }

    /// Sends `message` without waiting for a reply.
    pub async fn send(&mut self, message: &Message) -> ClientResult<()> {
        let text = message.encode()?;
        let sent = self.stream()?.send(Frame::Text(text.into())).await;
        sent.map_err(|e| self.fail(e.to_string()))
    }

    /// Waits for the next message from the peer.
    pub async fn receive(&mut self) -> ClientResult<Message> {
        let outcome = {
            let ws = self.stream()?;
            loop {
                match ws.next().await {
                    Some(Ok(Frame::Text(text))) => {
                        break Message::decode(text.as_str())
                            .map_err(|e| ClientError::MalformedResponse(e.to_string()));
                    }
                    Some(Ok(Frame::Binary(_))) => {
                        break Err(ClientError::MalformedResponse(
                            "unexpected binary frame".into(),
                        ));
                    }
                    Some(Ok(Frame::Close(_))) | None => {
                        break Err(ClientError::Connection(
                            "connection closed before a response arrived".into(),
                        ));
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => break Err(ClientError::Connection(e.to_string())),
                }
            }
        };

        if let Err(ClientError::Connection(_)) = &outcome {
            self.mark_closed();
        }
        outcome
    }

    /// Closes the connection. Closing twice is a no-op.
    pub async fn close(&mut self) {
        if let Some(mut ws) = self.ws.take() {
            if let Err(e) = ws.close(None).await {
                debug!(error = %e, "error while closing peer connection");
            }
        }
        self.state = ConnectionState::Closed;
    }

    fn stream(&mut self) -> ClientResult<&mut WsStream> {
        match (self.state, self.ws.as_mut()) {
            (ConnectionState::Open, Some(ws)) => Ok(ws),
            _ => Err(ClientError::NotConnected),
        }
    }

    fn fail(&mut self, message: String) -> ClientError {
        self.mark_closed();
        ClientError::Connection(message)
    }

    fn mark_closed(&mut self) {
        self.ws = None;
        self.state = ConnectionState::Closed;
    }
}

/// Installs the process-wide TLS provider used for `wss` peers.
fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        // Fails only if the host application installed its own provider.
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

impl std::fmt::Debug for PeerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerConnection")
            .field("address", &self.address)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_connection_is_connecting() {
        let connection = PeerConnection::new(ServerAddress::new("localhost", 3010));
        assert_eq!(connection.state(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn request_before_open_is_rejected() {
        let mut connection = PeerConnection::new(ServerAddress::new("localhost", 3010));
        let err = connection.request(&Message::ListKeys).await.unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
    }

    #[tokio::test]
    async fn failed_open_is_terminal() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut connection = PeerConnection::new(ServerAddress::new("127.0.0.1", port));
        let err = connection.open().await.unwrap_err();
        assert!(matches!(err, ClientError::Connection(_)));
        assert_eq!(connection.state(), ConnectionState::Closed);

        let err = connection.open().await.unwrap_err();
        assert!(matches!(err, ClientError::NotConnected));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let mut connection = PeerConnection::new(ServerAddress::new("localhost", 3010));
        connection.close().await;
        connection.close().await;
        assert_eq!(connection.state(), ConnectionState::Closed);
    }
}
