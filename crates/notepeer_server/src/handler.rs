//! Per-message request dispatch.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::registry::NoteRegistry;
use crate::vault::{write_note, VaultStore};
use notepeer_protocol::{Message, NoteBody, NotePayload};
use std::sync::Arc;
use tracing::warn;

/// Context shared by every connection of one server.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Note registry (shared across all connections).
    pub registry: Arc<NoteRegistry>,
    /// Vault that `push-note` writes into.
    pub vault: Option<Arc<dyn VaultStore>>,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(
        config: ServerConfig,
        registry: Arc<NoteRegistry>,
        vault: Option<Arc<dyn VaultStore>>,
    ) -> Self {
        Self {
            config,
            registry,
            vault,
        }
    }
}

/// Handler for protocol requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Dispatches a decoded message and returns the response.
    ///
    /// Failures are returned as errors; [`RequestHandler::respond`] turns
    /// them into `error` messages.
    pub fn handle(&self, message: Message) -> ServerResult<Message> {
        match message {
            Message::RegisterNote(body) => Ok(self.handle_register(body)),
            Message::Note(NotePayload::Query { key }) => Ok(self.handle_get(&key)),
            Message::DeleteNote(note) => Ok(self.handle_delete(&note.key)),
            Message::PushNote(body) => self.handle_push(body),
            Message::ListKeys => Ok(Message::key_list(self.context.registry.list_keys())),
            other => Err(ServerError::InvalidRequest(format!(
                "{} is not a request",
                other.kind()
            ))),
        }
    }

    /// Dispatches a message, converting any failure into an `error` response.
    pub fn respond(&self, message: Message) -> Message {
        let kind = message.kind();
        match self.handle(message) {
            Ok(response) => response,
            Err(e @ ServerError::InvalidRequest(_)) => {
                warn!(%kind, error = %e, "rejecting message");
                Message::invalid_format()
            }
            Err(e) => {
                warn!(%kind, error = %e, "request failed");
                Message::error(e.to_string())
            }
        }
    }

    fn handle_register(&self, body: NoteBody) -> Message {
        self.context.registry.register(&body.key, &body.content);
        Message::ack(format!("Note '{}' registered", body.key))
    }

    fn handle_get(&self, key: &str) -> Message {
        match self.context.registry.get(key) {
            Some(content) => Message::note_content(content),
            None => Message::note_not_found(),
        }
    }

    fn handle_delete(&self, key: &str) -> Message {
        self.context.registry.delete(key);
        Message::ack(format!("Note '{}' deleted", key))
    }

    fn handle_push(&self, body: NoteBody) -> ServerResult<Message> {
        // The registry keeps the pushed content even if the file write fails.
        self.context.registry.register(&body.key, &body.content);

        let vault = self
            .context
            .vault
            .as_ref()
            .ok_or(ServerError::VaultUnavailable)?;
        let path = write_note(
            vault.as_ref(),
            &body.key,
            &body.content,
            &self.context.config.note_extension,
        )?;
        Ok(Message::ack(path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{FsVault, MemoryVault};
    use notepeer_protocol::{INVALID_FORMAT, NOTE_NOT_FOUND};

    fn create_handler(vault: Option<Arc<dyn VaultStore>>) -> (RequestHandler, Arc<NoteRegistry>) {
        let registry = Arc::new(NoteRegistry::new());
        let context = Arc::new(HandlerContext::new(
            ServerConfig::default(),
            Arc::clone(&registry),
            vault,
        ));
        (RequestHandler::new(context), registry)
    }

    #[test]
    fn register_then_fetch() {
        let (handler, _) = create_handler(None);

        let ack = handler.respond(Message::register_note("test", "hello"));
        assert_eq!(ack, Message::ack("Note 'test' registered"));

        let note = handler.respond(Message::note_request("test"));
        assert_eq!(note, Message::note_content("hello"));
    }

    #[test]
    fn fetch_missing_returns_sentinel() {
        let (handler, _) = create_handler(None);
        let note = handler.respond(Message::note_request("ghost"));
        assert_eq!(note, Message::note_content(NOTE_NOT_FOUND));
    }

    #[test]
    fn delete_acks_whether_or_not_present() {
        let (handler, registry) = create_handler(None);
        registry.register("k", "v");

        let first = handler.respond(Message::delete_note("k"));
        let second = handler.respond(Message::delete_note("k"));
        assert_eq!(first, Message::ack("Note 'k' deleted"));
        assert_eq!(first, second);
        assert!(registry.is_empty());
    }

    #[test]
    fn list_keys() {
        let (handler, registry) = create_handler(None);
        registry.register("one", "1");
        registry.register("two", "2");

        let response = handler.respond(Message::ListKeys);
        assert_eq!(
            response,
            Message::key_list(vec!["one".to_string(), "two".to_string()])
        );
    }

    #[test]
    fn push_writes_vault_and_registry() {
        let vault = Arc::new(MemoryVault::new());
        let (handler, registry) = create_handler(Some(vault.clone()));

        let response = handler.respond(Message::push_note("Road trip", "- tent"));
        assert_eq!(response, Message::ack("Road trip.md"));
        assert_eq!(vault.read("Road trip.md"), Some("- tent".to_string()));
        assert_eq!(registry.get("Road trip"), Some("- tent".to_string()));
    }

    #[test]
    fn push_failure_keeps_registry_entry() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Arc::new(FsVault::new(dir.path().join("does-not-exist")));
        let (handler, registry) = create_handler(Some(vault));

        let response = handler.respond(Message::push_note("k", "v"));
        match response {
            Message::Error(notice) => assert!(notice.message.contains("failed to write")),
            other => panic!("expected error, got {:?}", other),
        }
        assert_eq!(registry.get("k"), Some("v".to_string()));
    }

    #[test]
    fn push_without_vault_is_an_error() {
        let (handler, registry) = create_handler(None);
        let response = handler.respond(Message::push_note("k", "v"));
        assert!(matches!(response, Message::Error(_)));
        assert!(registry.contains("k"));
    }

    #[test]
    fn responses_are_not_requests() {
        let (handler, _) = create_handler(None);
        for message in [
            Message::ack("hi"),
            Message::error("boom"),
            Message::key_list(vec![]),
            Message::note_content("stray"),
        ] {
            assert_eq!(handler.respond(message), Message::error(INVALID_FORMAT));
        }
    }
}
