//! Peer addresses and shareable note links.

use crate::error::{ProtocolError, ProtocolResult};
use std::fmt;

/// Port a sync server listens on when none is given.
pub const DEFAULT_PORT: u16 = 3010;

/// Scheme used when rendering a [`ShareKey`].
pub const DEFAULT_SHARE_SCHEME: &str = "notepeer";

/// Location of a sync server.
///
/// Accepted forms: `host`, `host:port`, `[v6]:port`, `ws://host:port`,
/// `wss://host:port`. The port defaults to [`DEFAULT_PORT`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    /// Host name or IP literal, without brackets.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Whether to connect with TLS (`wss`).
    pub secure: bool,
}

impl ServerAddress {
    /// Creates a plain (`ws`) address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            secure: false,
        }
    }

    /// Parses a connection string.
    pub fn parse(input: &str) -> ProtocolResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ProtocolError::invalid_address("empty address"));
        }

        let (secure, rest) = match input.split_once("://") {
            Some(("ws", rest)) => (false, rest),
            Some(("wss", rest)) => (true, rest),
            Some((scheme, _)) => {
                return Err(ProtocolError::invalid_address(format!(
                    "unsupported scheme: {}",
                    scheme
                )))
            }
            None => (false, input),
        };

        // Anything after the authority is ignored; the protocol has no paths.
        let authority = rest.split('/').next().unwrap_or_default();
        let (host, port) = split_authority(authority)?;

        Ok(Self {
            host,
            port: port.unwrap_or(DEFAULT_PORT),
            secure,
        })
    }

    /// Returns the WebSocket URL for this address.
    pub fn ws_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}", scheme, self.authority())
    }

    /// Returns `host:port`, bracketing IPv6 literals.
    pub fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ws_url())
    }
}

impl std::str::FromStr for ServerAddress {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<std::net::SocketAddr> for ServerAddress {
    fn from(addr: std::net::SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}

fn split_authority(authority: &str) -> ProtocolResult<(String, Option<u16>)> {
    if authority.is_empty() {
        return Err(ProtocolError::invalid_address("empty host"));
    }

    if let Some(bracketed) = authority.strip_prefix('[') {
        let (host, tail) = bracketed
            .split_once(']')
            .ok_or_else(|| ProtocolError::invalid_address("unterminated IPv6 literal"))?;
        if host.is_empty() {
            return Err(ProtocolError::invalid_address("empty host"));
        }
        let port = match tail {
            "" => None,
            tail => match tail.strip_prefix(':') {
                Some(port) => Some(parse_port(port)?),
                None => {
                    return Err(ProtocolError::invalid_address(format!(
                        "unexpected text after IPv6 literal: {}",
                        tail
                    )))
                }
            },
        };
        return Ok((host.to_string(), port));
    }

    match authority.matches(':').count() {
        0 => Ok((authority.to_string(), None)),
        1 => {
            let (host, port) = authority
                .split_once(':')
                .ok_or_else(|| ProtocolError::invalid_address(authority.to_string()))?;
            if host.is_empty() {
                return Err(ProtocolError::invalid_address("empty host"));
            }
            Ok((host.to_string(), Some(parse_port(port)?)))
        }
        // Unbracketed IPv6 literal; there is no way to tell a port apart.
        _ => Ok((authority.to_string(), None)),
    }
}

fn parse_port(port: &str) -> ProtocolResult<u16> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(ProtocolError::invalid_address(format!(
            "invalid port: {}",
            port
        ))),
        Ok(port) => Ok(port),
    }
}

/// A human-shareable link to a note: `scheme://host:port/note/key`.
///
/// The scheme is free-form (hosts register their own); only the authority
/// and the `/note/` path matter. The key is percent-decoded and may itself
/// contain `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareKey {
    /// Scheme the link was written with.
    pub scheme: String,
    /// Server holding the note.
    pub address: ServerAddress,
    /// Note key.
    pub key: String,
}

impl ShareKey {
    /// Creates a share key with the default scheme.
    pub fn new(address: ServerAddress, key: impl Into<String>) -> Self {
        Self {
            scheme: DEFAULT_SHARE_SCHEME.to_string(),
            address,
            key: key.into(),
        }
    }

    /// Parses a share link.
    pub fn parse(input: &str) -> ProtocolResult<Self> {
        let input = input.trim();
        let (scheme, rest) = input
            .split_once("://")
            .ok_or_else(|| ProtocolError::invalid_address("share key has no scheme"))?;
        if scheme.is_empty() {
            return Err(ProtocolError::invalid_address("share key has no scheme"));
        }

        let (authority, path) = rest
            .split_once('/')
            .ok_or_else(|| ProtocolError::invalid_address("share key has no note path"))?;
        let (host, port) = split_authority(authority)?;

        let encoded_key = path
            .strip_prefix("note/")
            .ok_or_else(|| ProtocolError::invalid_address("share key path must start with /note/"))?;
        let key = urlencoding::decode(encoded_key)
            .map_err(|e| ProtocolError::invalid_address(format!("share key is not UTF-8: {}", e)))?
            .into_owned();
        if key.is_empty() {
            return Err(ProtocolError::invalid_address("share key has an empty note key"));
        }

        Ok(Self {
            scheme: scheme.to_string(),
            address: ServerAddress::new(host, port.unwrap_or(DEFAULT_PORT)),
            key,
        })
    }
}

impl fmt::Display for ShareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}/note/{}",
            self.scheme,
            self.address.authority(),
            encode_key(&self.key)
        )
    }
}

/// Escapes each `/`-separated segment so folder-qualified keys stay readable.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment))
        .collect::<Vec<_>>()
        .join("/")
}

impl std::str::FromStr for ShareKey {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
