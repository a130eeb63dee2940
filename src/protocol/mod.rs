//! WebSocket wire protocol: upgrade handshake and frame codec.
//!
//! Everything here is pure computation over byte slices. Transport I/O
//! lives in [`crate::ws`].

pub mod digest;
pub mod frame;
pub mod handshake;

pub use digest::digest_base64;
pub use frame::{FrameHeader, decode_frame, encode_text};
pub use handshake::{build_response, extract_key};
