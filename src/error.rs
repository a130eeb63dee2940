//! Error types for the chat server.
//!
//! Every failure is local to one connection: a [`SessionError`] ends the
//! session that produced it and nothing else. No close frame or status code
//! is ever sent to the peer; the transport is simply dropped.

use crate::domain::ConnectionId;

/// Failure while negotiating the HTTP upgrade.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HandshakeError {
    /// The peer closed the stream before sending a request.
    #[error("connection closed before handshake request")]
    ConnectionClosed,

    /// The request carried no usable `Sec-WebSocket-Key` header.
    #[error("missing Sec-WebSocket-Key header")]
    MissingKey,
}

/// Failure while decoding an inbound frame.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    /// The buffer is shorter than the header or the declared payload.
    #[error("insufficient frame data: need {needed} bytes, have {available}")]
    Insufficient {
        /// Bytes required to decode the frame, as declared by its header.
        needed: u64,
        /// Bytes actually present in the buffer.
        available: usize,
    },
}

/// Failure while mutating the connection registry.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A handle with this identifier is already registered.
    #[error("connection {0} already registered")]
    DuplicateConnection(ConnectionId),
}

/// Failure that terminates a single connection session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport read or write failed.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// Upgrade handshake could not be completed.
    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    /// The connection could not be registered.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl SessionError {
    /// Returns `true` if the session ended before the connection was
    /// registered for broadcast.
    #[must_use]
    pub const fn is_handshake_failure(&self) -> bool {
        matches!(self, Self::Handshake(_))
    }
}

/// Failure while loading [`crate::config::ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LISTEN_ADDR` is not a valid socket address.
    #[error("invalid listen address {value:?}: {source}")]
    InvalidListenAddr {
        /// The raw value that failed to parse.
        value: String,
        /// Underlying parse error.
        source: std::net::AddrParseError,
    },
}
