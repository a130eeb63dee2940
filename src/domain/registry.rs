//! Registry of live, handshaken connections with broadcast fan-out.
//!
//! [`ConnectionRegistry`] owns the write half of every registered
//! transport in a `HashMap` keyed by [`ConnectionId`]. A single
//! [`tokio::sync::Mutex`] guards the map for the full duration of every
//! operation, including the network writes of a broadcast, so two
//! broadcasts never interleave and no broadcast observes a half-applied
//! registration.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use super::ConnectionId;
use crate::error::RegistryError;
use crate::protocol::encode_text;

/// Write half of a peer's transport, owned by the registry while the peer
/// is registered.
pub type PeerWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Outcome of a single [`ConnectionRegistry::broadcast_except`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Number of peers the frame was written to.
    pub delivered: usize,
    /// Peers whose write failed. Their sessions are not affected here.
    pub failed: Vec<ConnectionId>,
}

/// Set of connections eligible to receive broadcast messages.
///
/// # Concurrency
///
/// - `register`, `unregister` and `broadcast_except` are mutually exclusive.
/// - A broadcast holds the lock while writing to every peer, so its
///   latency is bounded by the slowest peer.
pub struct ConnectionRegistry {
    peers: Mutex<HashMap<ConnectionId, PeerWriter>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
        }
    }

    /// Adds a peer's write half under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateConnection`] if `id` is already
    /// registered. The existing handle is left untouched.
    pub async fn register(
        &self,
        id: ConnectionId,
        writer: PeerWriter,
    ) -> Result<(), RegistryError> {
        let mut peers = self.peers.lock().await;
        match peers.entry(id) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateConnection(id)),
            Entry::Vacant(slot) => {
                slot.insert(writer);
                Ok(())
            }
        }
    }

    /// Removes the peer registered under `id`, returning its write half.
    pub async fn unregister(&self, id: ConnectionId) -> Option<PeerWriter> {
        self.peers.lock().await.remove(&id)
    }

    /// Encodes `message` once as a text frame and writes it to every
    /// registered peer except `sender`.
    ///
    /// A failed write is logged and recorded in the report; delivery to
    /// the remaining peers continues.
    pub async fn broadcast_except(
        &self,
        message: &[u8],
        sender: ConnectionId,
    ) -> BroadcastReport {
        let frame = encode_text(message);
        let mut report = BroadcastReport::default();

        let mut peers = self.peers.lock().await;
        for (id, writer) in peers.iter_mut().filter(|(id, _)| **id != sender) {
            match write_frame(writer, &frame).await {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    tracing::warn!(conn = %id, %error, "broadcast write failed");
                    report.failed.push(*id);
                }
            }
        }

        report
    }

    /// Returns `true` if a peer is registered under `id`.
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.peers.lock().await.contains_key(&id)
    }

    /// Returns the number of registered peers.
    pub async fn len(&self) -> usize {
        self.peers.lock().await.len()
    }

    /// Returns `true` if no peers are registered.
    pub async fn is_empty(&self) -> bool {
        self.peers.lock().await.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry").finish_non_exhaustive()
    }
}

async fn write_frame(writer: &mut PeerWriter, frame: &[u8]) -> std::io::Result<()> {
    writer.write_all(frame).await?;
    writer.flush().await
}
