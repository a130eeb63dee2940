//! # relay-chat
//!
//! Minimal real-time broadcast chat server that speaks the WebSocket wire
//! protocol (RFC 6455) directly over TCP: upgrade handshake, frame
//! encoding and decoding, and client-mask removal are all done here rather
//! than by a WebSocket library. Every text message a peer sends is relayed
//! to every other connected peer.
//!
//! ## Architecture
//!
//! ```text
//! TcpListener (ws::listener)
//!     │  one task per accepted stream
//!     ├── Session (ws::session)
//!     │     ├── Handshake (protocol::handshake, protocol::digest)
//!     │     └── Frame decode (protocol::frame)
//!     │
//!     └── ConnectionRegistry (domain::registry)
//!           └── Frame encode + fan-out to every other peer
//! ```
//!
//! Out of scope: TLS, authentication, rooms, persistence, fragmented
//! messages, ping/pong and close-frame negotiation.

pub mod config;
pub mod domain;
pub mod error;
pub mod protocol;
pub mod ws;
