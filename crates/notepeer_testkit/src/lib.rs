//! # notepeer Testkit
//!
//! Test utilities for notepeer.
//!
//! This crate provides:
//! - [`TestServer`], a sync server on an ephemeral port with a temporary vault
//! - [`SilentPeer`], a WebSocket endpoint that never answers
//! - [`RawPeer`], a bare WebSocket connection for sending arbitrary frames
//! - Property-based test generators using proptest
//! - Load tests driving concurrent writers at a registry or a server
//!
//! ## Usage
//!
//! ```rust,ignore
//! use notepeer_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn fetch() {
//!     let server = TestServer::start().await;
//!     server.registry().register("test", "hello");
//!     // ... point a client at server.address()
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
