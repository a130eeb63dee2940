//! Per-connection state machine.
//!
//! `Connecting -> Handshaking -> Open -> Closed`. The session reads the
//! upgrade request once, answers it, registers its write half and then
//! relays every decoded frame to the other peers until a read fails or
//! returns zero bytes. There are no timeouts and no close-frame handling.

use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf};

use crate::domain::{ConnectionId, ConnectionRegistry};
use crate::error::{HandshakeError, SessionError};
use crate::protocol::{build_response, decode_frame, extract_key};

/// Lifecycle state of a [`run_session`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport accepted, nothing exchanged yet.
    Connecting,
    /// Waiting for and answering the upgrade request.
    Handshaking,
    /// Registered and relaying frames.
    Open,
    /// Terminal.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Handshaking => "handshaking",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Drives one peer connection from accept to close.
///
/// The transport's write half is owned by `registry` while the session is
/// `Open`; it is unregistered and shut down before this returns. A
/// connection that fails the handshake is never registered.
///
/// # Errors
///
/// Returns [`SessionError::Handshake`] if the peer closes before sending a
/// request or the request has no `Sec-WebSocket-Key`,
/// [`SessionError::Registry`] if the generated id collides, and
/// [`SessionError::Io`] if a transport read or the handshake write fails.
/// A read failure while `Open` is still reported after cleanup.
pub async fn run_session<T>(
    mut transport: T,
    registry: Arc<ConnectionRegistry>,
    read_buffer_size: usize,
) -> Result<(), SessionError>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let id = ConnectionId::new();
    let mut buf = vec![0u8; read_buffer_size.max(1)];
    let mut state = SessionState::Connecting;
    tracing::trace!(conn = %id, %state, "session started");

    state = SessionState::Handshaking;
    tracing::trace!(conn = %id, %state, "awaiting upgrade request");
    let n = transport.read(&mut buf).await?;
    if n == 0 {
        return Err(HandshakeError::ConnectionClosed.into());
    }
    let request = buf.get(..n).unwrap_or_default();
    let key = extract_key(request).ok_or(HandshakeError::MissingKey)?;
    transport.write_all(build_response(key).as_bytes()).await?;
    transport.flush().await?;

    let (reader, writer) = tokio::io::split(transport);
    registry.register(id, Box::new(writer)).await?;
    state = SessionState::Open;
    tracing::info!(conn = %id, %state, "client connected");

    let result = relay(id, reader, &mut buf, &registry).await;

    if let Some(mut writer) = registry.unregister(id).await
        && let Err(error) = writer.shutdown().await
    {
        tracing::debug!(conn = %id, %error, "transport shutdown failed");
    }
    state = SessionState::Closed;
    tracing::info!(conn = %id, %state, "client disconnected");

    result
}

/// `Open` loop: read, decode, broadcast, until the transport ends.
async fn relay<T>(
    id: ConnectionId,
    mut reader: ReadHalf<T>,
    buf: &mut [u8],
    registry: &ConnectionRegistry,
) -> Result<(), SessionError>
where
    T: AsyncRead + AsyncWrite,
{
    loop {
        let n = reader.read(buf).await?;
        if n == 0 {
            return Ok(());
        }

        let bytes = buf.get(..n).unwrap_or_default();
        match decode_frame(bytes) {
            Ok(message) => {
                tracing::debug!(
                    conn = %id,
                    message = %String::from_utf8_lossy(&message),
                    "chat"
                );
                let report = registry.broadcast_except(&message, id).await;
                tracing::trace!(
                    conn = %id,
                    delivered = report.delivered,
                    failed = report.failed.len(),
                    "broadcast done"
                );
            }
            Err(error) => {
                tracing::debug!(conn = %id, %error, "skipping undecodable read");
            }
        }
    }
}
