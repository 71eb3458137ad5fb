//! # notepeer Client
//!
//! Peer client and conflict resolution workflow for notepeer.
//!
//! This crate provides:
//! - [`PeerClient`], one request/response exchange per call
//! - [`PeerConnection`], the `Connecting → Open → Closed` connection state machine
//! - [`OfferSet`], the sequential accept/skip fold over incoming offers
//! - [`ConflictSession`], gathering offers from peers and committing the result
//!
//! ## One-shot exchanges
//!
//! Every client call opens a fresh WebSocket connection, sends exactly one
//! request, waits for the next frame and closes. Correlation is implicit:
//! the next message received is the response. A configurable timeout
//! bounds the whole exchange.
//!
//! ```rust,ignore
//! use notepeer_client::PeerClient;
//! use notepeer_protocol::ServerAddress;
//!
//! let client = PeerClient::default();
//! let peer = ServerAddress::parse("192.168.1.20")?;
//! let content = client.request_note(&peer, "Groceries").await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod client;
mod config;
mod connection;
mod error;
mod resolve;
mod session;

pub use client::PeerClient;
pub use config::ClientConfig;
pub use connection::{ConnectionState, PeerConnection};
pub use error::{ClientError, ClientResult};
pub use resolve::{
    confirm_push, Decision, Offer, OfferPrompt, OfferSet, OfferView, PromptOutcome, PushPrompt,
    Resolution,
};
pub use session::{ConflictSession, SkippedPeer};
