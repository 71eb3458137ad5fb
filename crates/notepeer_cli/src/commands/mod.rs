//! CLI command implementations.

pub mod fetch;
pub mod notes;
pub mod resolve;
pub mod serve;
