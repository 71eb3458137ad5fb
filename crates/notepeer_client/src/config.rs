//! Configuration for the peer client.

use std::time::Duration;

/// Configuration for peer client calls.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound on one call: connect, send, and wait for the reply.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a new client configuration.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
