//! # notepeer protocol
//!
//! Wire types for the notepeer note-synchronization protocol.
//!
//! This crate provides:
//! - [`Message`], the tagged union exchanged between peers
//! - JSON text encoding/decoding of messages (one message per frame)
//! - [`ServerAddress`] parsing for peer connection strings
//! - [`ShareKey`] parsing for human-shareable note links
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! # Wire format
//!
//! ```text
//! {"type":"note","payload":{"key":"Groceries"}}
//! {"type":"note","payload":{"content":"- milk"}}
//! {"type":"register-note","payload":{"key":"Groceries","content":"- milk"}}
//! {"type":"list-keys"}
//! {"type":"key-list","payload":{"keys":["Groceries"]}}
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod address;
mod error;
mod message;

pub use address::{ServerAddress, ShareKey, DEFAULT_PORT, DEFAULT_SHARE_SCHEME};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    is_not_found, KeyList, Message, MessageKind, NoteBody, NoteKey, NotePayload, Notice,
    INVALID_FORMAT, NOTE_NOT_FOUND,
};
