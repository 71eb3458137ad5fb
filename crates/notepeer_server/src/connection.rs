//! Per-connection frame loop.

use crate::server::SyncServer;
use futures_util::{SinkExt, StreamExt};
use notepeer_protocol::Message;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::OwnedSemaphorePermit;
use tokio_tungstenite::tungstenite::Message as Frame;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Runs one connection: `Open → (receive → dispatch → respond)* → Closed`.
///
/// Frames are handled strictly in arrival order. The permit is held for the
/// lifetime of the connection.
pub(crate) async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    server: Arc<SyncServer>,
    _permit: OwnedSemaphorePermit,
) {
    let span = info_span!("connection", id = %Uuid::new_v4(), %peer);
    run(stream, server).instrument(span).await
}

async fn run(stream: TcpStream, server: Arc<SyncServer>) {
    let mut ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(error = %e, "websocket handshake failed");
            return;
        }
    };
    info!("connection open");

    while let Some(frame) = ws.next().await {
        let response = match frame {
            Ok(Frame::Text(text)) => server.dispatch_text(text.as_str()).await,
            Ok(Frame::Binary(_)) => {
                warn!("rejecting binary frame");
                Message::invalid_format()
            }
            Ok(Frame::Close(_)) => {
                // Send the close reply tungstenite queued.
                if let Err(e) = ws.flush().await {
                    debug!(error = %e, "failed to flush close reply");
                }
                break;
            }
            // Ping/pong are answered by the websocket layer.
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "connection error");
                break;
            }
        };

        let text = match response.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to encode response");
                continue;
            }
        };
        debug!(kind = %response.kind(), "sending response");
        if let Err(e) = ws.send(Frame::Text(text.into())).await {
            warn!(error = %e, "failed to send response");
            break;
        }
    }

    info!("connection closed");
}
