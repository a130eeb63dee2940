//! Domain layer: connection identity and the broadcast registry.

pub mod connection_id;
pub mod registry;

pub use connection_id::ConnectionId;
pub use registry::{BroadcastReport, ConnectionRegistry, PeerWriter};
