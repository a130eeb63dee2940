//! HTTP upgrade handshake (RFC 6455 §1.3, §4.2).
//!
//! Only the `Sec-WebSocket-Key` header is inspected. The method, path,
//! `Upgrade`, `Connection` and `Sec-WebSocket-Version` headers are accepted
//! as sent.

use super::digest::digest_base64;

/// Fixed GUID appended to the client key before hashing.
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Name of the header carrying the client's opening key.
const KEY_HEADER: &str = "Sec-WebSocket-Key";

/// Extracts the trimmed `Sec-WebSocket-Key` value from a raw request.
///
/// Lines are scanned as bytes, so non-UTF-8 text in other headers is
/// tolerated. Header names are compared ASCII case-insensitively. Returns
/// `None` when there is no such header line or its value is blank or not
/// UTF-8.
#[must_use]
pub fn extract_key(raw_request: &[u8]) -> Option<&str> {
    raw_request
        .split(|&b| b == b'\n')
        .filter_map(|line| {
            let mut parts = line.splitn(2, |&b| b == b':');
            Some((parts.next()?, parts.next()?))
        })
        .find(|(name, _)| name.trim_ascii().eq_ignore_ascii_case(KEY_HEADER.as_bytes()))
        .and_then(|(_, value)| std::str::from_utf8(value.trim_ascii()).ok())
        .filter(|value| !value.is_empty())
}

/// Computes the `Sec-WebSocket-Accept` token for a client key.
#[must_use]
pub fn accept_token(key: &str) -> String {
    let mut input = String::with_capacity(key.len() + WEBSOCKET_GUID.len());
    input.push_str(key);
    input.push_str(WEBSOCKET_GUID);
    digest_base64(input.as_bytes())
}

/// Formats the `101 Switching Protocols` response for a client key.
#[must_use]
pub fn build_response(key: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\
         \r\n",
        accept_token(key)
    )
}
