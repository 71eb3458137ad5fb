//! Protocol messages.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};

/// Content returned for a `note` request when the key is not registered.
pub const NOTE_NOT_FOUND: &str = "Note not found";

/// Error text returned for frames that are not a valid request.
pub const INVALID_FORMAT: &str = "Invalid format";

/// Returns true if `content` is the not-found sentinel.
pub fn is_not_found(content: &str) -> bool {
    content == NOTE_NOT_FOUND
}

/// A notepeer protocol message.
///
/// Serialized as `{"type": <kind>, "payload": <payload>}`. `list-keys`
/// is encoded without a payload; any payload it arrives with is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum Message {
    /// Note lookup (request) or note content (response).
    Note(NotePayload),
    /// Register or overwrite a note in the registry.
    RegisterNote(NoteBody),
    /// Remove a note from the registry.
    DeleteNote(NoteKey),
    /// Register a note and write it into the receiving peer's vault.
    PushNote(NoteBody),
    /// List all registered keys.
    ListKeys,
    /// Positive acknowledgement.
    Ack(Notice),
    /// Request failure.
    Error(Notice),
    /// Registered keys.
    KeyList(KeyList),
}

/// Payload of a `note` message.
///
/// Requests carry a key, responses carry content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotePayload {
    /// Lookup of a note by key.
    Query {
        /// Note key.
        key: String,
    },
    /// Content of the requested note, or [`NOTE_NOT_FOUND`].
    Content {
        /// Note body.
        content: String,
    },
}

/// A key and its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteBody {
    /// Note key.
    pub key: String,
    /// Note body.
    pub content: String,
}

/// A bare note key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteKey {
    /// Note key.
    pub key: String,
}

/// Human-readable text carried by `ack` and `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Message text.
    pub message: String,
}

/// Payload of `key-list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyList {
    /// Registered keys.
    pub keys: Vec<String>,
}

/// The `type` tag of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `note`
    Note,
    /// `register-note`
    RegisterNote,
    /// `delete-note`
    DeleteNote,
    /// `push-note`
    PushNote,
    /// `list-keys`
    ListKeys,
    /// `ack`
    Ack,
    /// `error`
    Error,
    /// `key-list`
    KeyList,
}

impl MessageKind {
    /// Returns the wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Note => "note",
            MessageKind::RegisterNote => "register-note",
            MessageKind::DeleteNote => "delete-note",
            MessageKind::PushNote => "push-note",
            MessageKind::ListKeys => "list-keys",
            MessageKind::Ack => "ack",
            MessageKind::Error => "error",
            MessageKind::KeyList => "key-list",
        }
    }

    /// Returns true for kinds a client may send.
    ///
    /// `note` is both a request and a response kind.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            MessageKind::Note
                | MessageKind::RegisterNote
                | MessageKind::DeleteNote
                | MessageKind::PushNote
                | MessageKind::ListKeys
        )
    }

    /// Returns the kind a server answers a successful request of this kind with.
    pub fn response_kind(&self) -> Option<MessageKind> {
        match self {
            MessageKind::Note => Some(MessageKind::Note),
            MessageKind::RegisterNote | MessageKind::DeleteNote | MessageKind::PushNote => {
                Some(MessageKind::Ack)
            }
            MessageKind::ListKeys => Some(MessageKind::KeyList),
            MessageKind::Ack | MessageKind::Error | MessageKind::KeyList => None,
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Message {
    /// Creates a `note` request.
    pub fn note_request(key: impl Into<String>) -> Self {
        Message::Note(NotePayload::Query { key: key.into() })
    }

    /// Creates a `note` response.
    pub fn note_content(content: impl Into<String>) -> Self {
        Message::Note(NotePayload::Content {
            content: content.into(),
        })
    }

    /// Creates a `note` response carrying the not-found sentinel.
    pub fn note_not_found() -> Self {
        Self::note_content(NOTE_NOT_FOUND)
    }

    /// Creates a `register-note` request.
    pub fn register_note(key: impl Into<String>, content: impl Into<String>) -> Self {
        Message::RegisterNote(NoteBody {
            key: key.into(),
            content: content.into(),
        })
    }

    /// Creates a `push-note` request.
    pub fn push_note(key: impl Into<String>, content: impl Into<String>) -> Self {
        Message::PushNote(NoteBody {
            key: key.into(),
            content: content.into(),
        })
    }

    /// Creates a `delete-note` request.
    pub fn delete_note(key: impl Into<String>) -> Self {
        Message::DeleteNote(NoteKey { key: key.into() })
    }

    /// Creates an `ack` response.
    pub fn ack(message: impl Into<String>) -> Self {
        Message::Ack(Notice {
            message: message.into(),
        })
    }

    /// Creates an `error` response.
    pub fn error(message: impl Into<String>) -> Self {
        Message::Error(Notice {
            message: message.into(),
        })
    }

    /// Creates the `error` response sent for undecodable or unexpected frames.
    pub fn invalid_format() -> Self {
        Self::error(INVALID_FORMAT)
    }

    /// Creates a `key-list` response.
    pub fn key_list(keys: Vec<String>) -> Self {
        Message::KeyList(KeyList { keys })
    }

    /// Returns the message kind.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Note(_) => MessageKind::Note,
            Message::RegisterNote(_) => MessageKind::RegisterNote,
            Message::DeleteNote(_) => MessageKind::DeleteNote,
            Message::PushNote(_) => MessageKind::PushNote,
            Message::ListKeys => MessageKind::ListKeys,
            Message::Ack(_) => MessageKind::Ack,
            Message::Error(_) => MessageKind::Error,
            Message::KeyList(_) => MessageKind::KeyList,
        }
    }

    /// Returns the note key this message refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Message::Note(NotePayload::Query { key }) => Some(key),
            Message::RegisterNote(body) | Message::PushNote(body) => Some(&body.key),
            Message::DeleteNote(k) => Some(&k.key),
            _ => None,
        }
    }

    /// Encodes the message as a JSON text frame.
    pub fn encode(&self) -> ProtocolResult<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Decodes a JSON text frame.
    ///
    /// Fails with [`ProtocolError::MalformedMessage`] if the text is not
    /// JSON, has no `type`, names an unknown type, or carries a payload of
    /// the wrong shape.
    pub fn decode(text: &str) -> ProtocolResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let kind = value.get("type").and_then(serde_json::Value::as_str);
        if kind == Some(MessageKind::ListKeys.as_str()) {
            return Ok(Message::ListKeys);
        }
        Ok(serde_json::from_value(value)?)
    }
}
