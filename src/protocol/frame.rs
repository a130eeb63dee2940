//! WebSocket frame codec (RFC 6455 §5.2, §5.3).
//!
//! Outgoing frames are always single, unmasked, FIN-terminated text frames.
//! Incoming buffers are decoded as exactly one frame: the opcode is not
//! interpreted, continuation and control frames are read as if they were
//! complete text frames, and bytes past the first frame are ignored.

use crate::error::FrameError;

/// FIN flag in the first header byte.
const FIN_BIT: u8 = 0x80;

/// MASK flag in the second header byte.
const MASK_BIT: u8 = 0x80;

/// Low bits of the second header byte holding the base length.
const LEN_MASK: u8 = 0x7F;

/// Base length value announcing a 16-bit extended length.
const LEN_16: u8 = 126;

/// Base length value announcing a 64-bit extended length.
const LEN_64: u8 = 127;

/// Opcode for a text frame.
pub const OPCODE_TEXT: u8 = 0x1;

/// Largest payload whose length fits in the base length field.
pub const MAX_SHORT_PAYLOAD: usize = 125;

/// Largest payload whose length fits in the 16-bit extended field.
pub const MAX_MEDIUM_PAYLOAD: usize = 65_535;

/// Parsed header of one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// FIN flag. Carried for diagnostics only.
    pub fin: bool,
    /// Raw 4-bit opcode. Carried for diagnostics only.
    pub opcode: u8,
    /// Masking key, present when the MASK flag is set.
    pub mask_key: Option<[u8; 4]>,
    /// Declared payload length.
    pub payload_len: u64,
    /// Bytes occupied by the header, including length extension and key.
    pub header_len: usize,
}

impl FrameHeader {
    /// Parses the header at the start of `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Insufficient`] if `buf` ends before the length
    /// field or masking key is complete.
    pub fn parse(buf: &[u8]) -> Result<Self, FrameError> {
        let available = buf.len();
        let &[first, second, ref rest @ ..] = buf else {
            return Err(FrameError::Insufficient {
                needed: 2,
                available,
            });
        };

        let (payload_len, rest, header_len) = match second & LEN_MASK {
            LEN_16 => {
                let Some((ext, rest)) = rest.split_first_chunk::<2>() else {
                    return Err(FrameError::Insufficient {
                        needed: 4,
                        available,
                    });
                };
                (u64::from(u16::from_be_bytes(*ext)), rest, 4)
            }
            LEN_64 => {
                let Some((ext, rest)) = rest.split_first_chunk::<8>() else {
                    return Err(FrameError::Insufficient {
                        needed: 10,
                        available,
                    });
                };
                (u64::from_be_bytes(*ext), rest, 10)
            }
            short => (u64::from(short), rest, 2),
        };

        if second & MASK_BIT == 0 {
            return Ok(Self {
                fin: first & FIN_BIT != 0,
                opcode: first & 0x0F,
                mask_key: None,
                payload_len,
                header_len,
            });
        }

        let header_len = header_len + 4;
        let Some((key, _)) = rest.split_first_chunk::<4>() else {
            return Err(FrameError::Insufficient {
                needed: (header_len as u64).saturating_add(payload_len),
                available,
            });
        };

        Ok(Self {
            fin: first & FIN_BIT != 0,
            opcode: first & 0x0F,
            mask_key: Some(*key),
            payload_len,
            header_len,
        })
    }

    /// Total bytes the frame occupies on the wire.
    #[must_use]
    pub const fn frame_len(&self) -> u64 {
        (self.header_len as u64).saturating_add(self.payload_len)
    }
}

/// XORs `payload` in place with `key`, cycling the key every four bytes.
///
/// Applying the same key twice restores the original bytes.
pub fn apply_mask(payload: &mut [u8], key: [u8; 4]) {
    for (byte, k) in payload.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
}

/// Wraps `message` in a single unmasked text frame.
#[must_use]
pub fn encode_text(message: &[u8]) -> Vec<u8> {
    let len = message.len();
    let mut frame = Vec::with_capacity(len + 10);
    frame.push(FIN_BIT | OPCODE_TEXT);

    match (u8::try_from(len), u16::try_from(len)) {
        (Ok(short), _) if len <= MAX_SHORT_PAYLOAD => frame.push(short),
        (_, Ok(medium)) => {
            frame.push(LEN_16);
            frame.extend_from_slice(&medium.to_be_bytes());
        }
        _ => {
            frame.push(LEN_64);
            frame.extend_from_slice(&(len as u64).to_be_bytes());
        }
    }

    frame.extend_from_slice(message);
    frame
}

/// Decodes the frame at the start of `buf` and returns its payload,
/// unmasked if a key is present.
///
/// # Errors
///
/// Returns [`FrameError::Insufficient`] if `buf` holds fewer bytes than the
/// header or the declared payload requires.
pub fn decode_frame(buf: &[u8]) -> Result<Vec<u8>, FrameError> {
    let header = FrameHeader::parse(buf)?;
    let insufficient = FrameError::Insufficient {
        needed: header.frame_len(),
        available: buf.len(),
    };

    let payload = usize::try_from(header.payload_len)
        .ok()
        .and_then(|len| buf.get(header.header_len..)?.get(..len))
        .ok_or(insufficient)?;

    let mut payload = payload.to_vec();
    if let Some(key) = header.mask_key {
        apply_mask(&mut payload, key);
    }
    Ok(payload)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const BOUNDARY_LENGTHS: [usize; 7] = [0, 1, 125, 126, 65_535, 65_536, 3 * 1024 * 1024];

    const KEYS: [[u8; 4]; 4] = [
        [0, 0, 0, 0],
        [0x37, 0xFA, 0x21, 0x3D],
        [0xFF, 0xFF, 0xFF, 0xFF],
        [0x01, 0x80, 0x7F, 0xAA],
    ];

    fn payload_of(len: usize) -> Vec<u8> {
        (0..len).map(|i| b'a' + (i % 26) as u8).collect()
    }

    /// Builds a client-style frame: same layout as the server's, with the
    /// MASK flag, key and masked payload when `key` is given.
    fn client_frame(payload: &[u8], key: Option<[u8; 4]>) -> Vec<u8> {
        let server = encode_text(payload);
        let header_len = server.len() - payload.len();
        let mut frame = server[..header_len].to_vec();
        if let Some(key) = key {
            frame[1] |= MASK_BIT;
            frame.extend_from_slice(&key);
            let mut masked = payload.to_vec();
            apply_mask(&mut masked, key);
            frame.extend_from_slice(&masked);
        } else {
            frame.extend_from_slice(payload);
        }
        frame
    }

    #[test]
    fn encode_sets_fin_and_text_opcode() {
        let frame = encode_text(b"hi");
        assert_eq!(frame, vec![0x81, 0x02, b'h', b'i']);
    }

    #[test]
    fn encode_picks_length_variant_by_boundary() {
        for len in BOUNDARY_LENGTHS {
            let frame = encode_text(&payload_of(len));
            let (base, header_len) = match len {
                0..=125 => (len as u8, 2),
                126..=65_535 => (LEN_16, 4),
                _ => (LEN_64, 10),
            };
            assert_eq!(frame[1], base, "base length for {len}");
            assert_eq!(frame.len(), header_len + len, "frame size for {len}");
            match header_len {
                4 => assert_eq!(u16::from_be_bytes([frame[2], frame[3]]) as usize, len),
                10 => {
                    let mut ext = [0u8; 8];
                    ext.copy_from_slice(&frame[2..10]);
                    assert_eq!(u64::from_be_bytes(ext) as usize, len);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn server_frames_are_never_masked() {
        for len in BOUNDARY_LENGTHS {
            let frame = encode_text(&payload_of(len));
            assert_eq!(frame[1] & MASK_BIT, 0);
        }
    }

    #[test]
    fn unmasked_round_trip_at_boundaries() {
        for len in BOUNDARY_LENGTHS {
            let payload = payload_of(len);
            let Ok(decoded) = decode_frame(&encode_text(&payload)) else {
                panic!("decode failed for length {len}");
            };
            assert_eq!(decoded, payload, "length {len}");
        }
    }

    #[test]
    fn masked_round_trip_restores_payload() {
        for len in [0, 1, 3, 4, 5, 125, 126, 1000, 65_536] {
            let payload = payload_of(len);
            for key in KEYS {
                let frame = client_frame(&payload, Some(key));
                let Ok(decoded) = decode_frame(&frame) else {
                    panic!("decode failed for length {len} key {key:?}");
                };
                assert_eq!(decoded, payload, "length {len} key {key:?}");
            }
        }
    }

    #[test]
    fn rfc_masked_hello_example() {
        // RFC 6455 §5.7: single-frame masked text "Hello".
        let frame = [
            0x81, 0x85, 0x37, 0xFA, 0x21, 0x3D, 0x7F, 0x9F, 0x4D, 0x51, 0x58,
        ];
        assert_eq!(decode_frame(&frame), Ok(b"Hello".to_vec()));
    }

    #[test]
    fn mask_is_symmetric() {
        let original = b"masking is an involution".to_vec();
        let key = [0x12, 0x34, 0x56, 0x78];
        let mut bytes = original.clone();
        apply_mask(&mut bytes, key);
        assert_ne!(bytes, original);
        apply_mask(&mut bytes, key);
        assert_eq!(bytes, original);
    }

    #[test]
    fn header_reports_mask_and_length() {
        let frame = client_frame(&payload_of(300), Some(KEYS[1]));
        let Ok(header) = FrameHeader::parse(&frame) else {
            panic!("header should parse");
        };
        assert!(header.fin);
        assert_eq!(header.opcode, OPCODE_TEXT);
        assert_eq!(header.mask_key, Some(KEYS[1]));
        assert_eq!(header.payload_len, 300);
        assert_eq!(header.header_len, 8);
        assert_eq!(header.frame_len(), frame.len() as u64);
    }

    #[test]
    fn every_truncation_is_insufficient() {
        for len in [0, 1, 125, 126, 300] {
            let payload = payload_of(len);
            for key in [None, Some(KEYS[1])] {
                let frame = client_frame(&payload, key);
                for cut in 0..frame.len() {
                    let result = decode_frame(&frame[..cut]);
                    assert!(
                        matches!(result, Err(FrameError::Insufficient { .. })),
                        "length {len} masked {} cut {cut}",
                        key.is_some()
                    );
                }
            }
        }
    }

    #[test]
    fn truncated_64_bit_frame_is_insufficient() {
        let payload = payload_of(65_536);
        for key in [None, Some(KEYS[3])] {
            let frame = client_frame(&payload, key);
            for cut in [2, 5, 9, 10, 13, frame.len() / 2, frame.len() - 1] {
                assert!(decode_frame(&frame[..cut]).is_err(), "cut {cut}");
            }
        }
    }

    #[test]
    fn oversized_declared_length_does_not_overflow() {
        let mut frame = vec![0x81, 0xFF];
        frame.extend_from_slice(&u64::MAX.to_be_bytes());
        frame.extend_from_slice(&[1, 2, 3, 4, b'x']);
        assert_eq!(
            decode_frame(&frame),
            Err(FrameError::Insufficient {
                needed: u64::MAX,
                available: 15,
            })
        );
    }

    #[test]
    fn short_buffers_report_needed_bytes() {
        assert_eq!(
            decode_frame(&[]),
            Err(FrameError::Insufficient {
                needed: 2,
                available: 0,
            })
        );
        assert_eq!(
            decode_frame(&[0x81, 0x7E, 0x01]),
            Err(FrameError::Insufficient {
                needed: 4,
                available: 3,
            })
        );
        assert_eq!(
            decode_frame(&[0x81, 0x85, 0x37]),
            Err(FrameError::Insufficient {
                needed: 11,
                available: 3,
            })
        );
    }

    #[test]
    fn trailing_bytes_after_frame_are_ignored() {
        let mut buf = client_frame(b"first", Some(KEYS[1]));
        buf.extend_from_slice(&client_frame(b"second", Some(KEYS[2])));
        assert_eq!(decode_frame(&buf), Ok(b"first".to_vec()));
    }

    #[test]
    fn opcode_is_not_interpreted() {
        // Unmasked binary frame without FIN decodes like text.
        let frame = [0x02, 0x03, b'a', b'b', b'c'];
        assert_eq!(decode_frame(&frame), Ok(b"abc".to_vec()));
    }
}
