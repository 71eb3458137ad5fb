//! One-shot peer client.

use crate::config::ClientConfig;
use crate::connection::PeerConnection;
use crate::error::{ClientError, ClientResult};
use notepeer_protocol::{Message, MessageKind, NotePayload, ServerAddress};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Client for talking to sync servers.
///
/// Stateless between calls: each call opens a connection, performs exactly
/// one request/response exchange and closes it.
#[derive(Debug, Clone, Default)]
pub struct PeerClient {
    config: ClientConfig,
}

impl PeerClient {
    /// Creates a new client.
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetches the content of `key` from `address`.
    ///
    /// A peer that does not hold the note answers with
    /// [`notepeer_protocol::NOTE_NOT_FOUND`], which is returned as-is.
    pub async fn request_note(&self, address: &ServerAddress, key: &str) -> ClientResult<String> {
        match self.exchange(address, Message::note_request(key)).await? {
            Message::Note(NotePayload::Content { content }) => Ok(content),
            other => Err(unexpected(MessageKind::Note, &other)),
        }
    }

    /// Registers `content` under `key` on `address` and returns the ack text.
    pub async fn register_note(
        &self,
        address: &ServerAddress,
        key: &str,
        content: &str,
    ) -> ClientResult<String> {
        let response = self
            .exchange(address, Message::register_note(key, content))
            .await?;
        expect_ack(response)
    }

    /// Registers a note in the background.
    ///
    /// Failures are logged; the handle yields the outcome for callers that
    /// do want it.
    pub fn spawn_register_note(
        &self,
        address: ServerAddress,
        key: String,
        content: String,
    ) -> JoinHandle<ClientResult<String>> {
        let client = self.clone();
        tokio::spawn(async move {
            let result = client.register_note(&address, &key, &content).await;
            if let Err(e) = &result {
                warn!(peer = %address, key = %key, error = %e, "background register failed");
            }
            result
        })
    }

    /// Pushes a note into the vault of `address` and returns the path the
    /// peer wrote.
    pub async fn push_note(
        &self,
        address: &ServerAddress,
        key: &str,
        content: &str,
    ) -> ClientResult<String> {
        let response = self
            .exchange(address, Message::push_note(key, content))
            .await?;
        expect_ack(response)
    }

    /// Deletes `key` on `address` and returns the ack text.
    pub async fn delete_note(&self, address: &ServerAddress, key: &str) -> ClientResult<String> {
        let response = self.exchange(address, Message::delete_note(key)).await?;
        expect_ack(response)
    }

    /// Lists the keys registered on `address`.
    pub async fn list_keys(&self, address: &ServerAddress) -> ClientResult<Vec<String>> {
        match self.exchange(address, Message::ListKeys).await? {
            Message::KeyList(list) => Ok(list.keys),
            other => Err(unexpected(MessageKind::KeyList, &other)),
        }
    }

    /// Connects, sends `request`, returns the first reply and closes.
    ///
    /// An `error` reply becomes [`ClientError::RequestFailed`].
    async fn exchange(&self, address: &ServerAddress, request: Message) -> ClientResult<Message> {
        let timeout = self.config.timeout;
        debug!(peer = %address, kind = %request.kind(), "sending request");

        let exchange = async {
            let mut connection = PeerConnection::connect(address).await?;
            let result = connection.request(&request).await;
            connection.close().await;
            result
        };

        let response = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| ClientError::Timeout(timeout))??;

        match response {
            Message::Error(notice) => Err(ClientError::RequestFailed(notice.message)),
            other => Ok(other),
        }
    }
}

fn expect_ack(response: Message) -> ClientResult<String> {
    match response {
        Message::Ack(notice) => Ok(notice.message),
        other => Err(unexpected(MessageKind::Ack, &other)),
    }
}

fn unexpected(expected: MessageKind, actual: &Message) -> ClientError {
    ClientError::UnexpectedResponse {
        expected,
        actual: actual.kind(),
    }
}
