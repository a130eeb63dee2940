//! SHA-1 digest rendered as standard base64.
//!
//! Used only to derive the `Sec-WebSocket-Accept` token. The alphabet is the
//! RFC 4648 "standard" variant with `=` padding, which conforming clients
//! compare byte-for-byte.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha1::{Digest, Sha1};

/// Returns the base64 encoding of the 20-byte SHA-1 digest of `input`.
#[must_use]
pub fn digest_base64(input: &[u8]) -> String {
    let hash = Sha1::digest(input);
    BASE64.encode(hash)
}
