//! Wire header codec.
//!
//! ```text
//! ┌─────────────┬──────────────────────┬─────────────────┬─────────────────┐
//! │ Magic (4B)  │ Static size S (8B LE)│ Static fields   │ Handler payload │
//! │             │                      │ (S bytes)       │ (rest)          │
//! └─────────────┴──────────────────────┴─────────────────┴─────────────────┘
//! ```

use bytes::{Buf, BufMut};

use crate::error::{EngineError, Result};
use crate::magic::{Magic, MAGIC_LEN};

/// Fixed header: magic (4) + static-fields size (8) = 12 bytes.
pub const HEADER_SIZE: usize = MAGIC_LEN + 8;

/// Borrowed view of a serialized object, split at the header boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireView<'a> {
    magic: [u8; MAGIC_LEN],
    static_fields: &'a [u8],
    payload: &'a [u8],
}

impl<'a> WireView<'a> {
    /// Magic bytes as stored, before validation.
    pub fn raw_magic(&self) -> &[u8; MAGIC_LEN] {
        &self.magic
    }

    /// Validated magic.
    pub fn magic(&self) -> Result<Magic> {
        Magic::from_bytes(&self.magic)
    }

    pub fn static_fields(&self) -> &'a [u8] {
        self.static_fields
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Total encoded length.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.static_fields.len() + self.payload.len()
    }
}

/// Decode the header of a serialized object and check the static-fields
/// bounds, without resolving a handler.
///
/// The magic is not validated here; see [`WireView::magic`].
pub fn peek_header(bytes: &[u8]) -> Result<WireView<'_>> {
    if bytes.len() < HEADER_SIZE {
        return Err(EngineError::Truncated {
            len: bytes.len(),
            min: HEADER_SIZE,
        });
    }

    let mut cursor = bytes;
    let mut magic = [0u8; MAGIC_LEN];
    cursor.copy_to_slice(&mut magic);
    let declared = cursor.get_u64_le();

    let remaining = cursor.len();
    let static_len = usize::try_from(declared)
        .ok()
        .filter(|len| *len <= remaining)
        .ok_or(EngineError::StaticFieldsOverrun {
            declared,
            remaining,
        })?;

    let (static_fields, payload) = cursor.split_at(static_len);
    Ok(WireView {
        magic,
        static_fields,
        payload,
    })
}

/// Write the header and static fields into `dest`; returns bytes written.
pub(crate) fn encode_header(dest: &mut [u8], magic: Magic, static_fields: &[u8]) -> Result<usize> {
    let written = HEADER_SIZE + static_fields.len();
    if dest.len() < written {
        return Err(EngineError::BufferTooSmall {
            len: dest.len(),
            required: written,
        });
    }

    let mut out = &mut dest[..written];
    out.put_slice(magic.as_bytes());
    out.put_u64_le(static_fields.len() as u64);
    out.put_slice(static_fields);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(magic: &[u8; 4], declared: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.put_slice(magic);
        buf.put_u64_le(declared);
        buf
    }

    #[test]
    fn encode_then_peek() {
        let magic = Magic::new("spl1").unwrap();
        let mut buf = vec![0u8; HEADER_SIZE + 3 + 2];
        let written = encode_header(&mut buf, magic, &[1, 2, 3]).unwrap();
        buf[written..].copy_from_slice(b"hi");

        assert_eq!(written, 15);
        assert_eq!(&buf[..12], b"spl1\x03\0\0\0\0\0\0\0");

        let view = peek_header(&buf).unwrap();
        assert_eq!(view.magic().unwrap(), magic);
        assert_eq!(view.static_fields(), &[1, 2, 3]);
        assert_eq!(view.payload(), b"hi");
        assert_eq!(view.encoded_len(), buf.len());
    }

    #[test]
    fn encode_rejects_short_destination() {
        let magic = Magic::new("spl1").unwrap();
        let mut buf = [0u8; 13];
        assert!(matches!(
            encode_header(&mut buf, magic, &[0; 2]),
            Err(EngineError::BufferTooSmall {
                len: 13,
                required: 14,
            })
        ));
        assert_eq!(buf, [0u8; 13]);
    }

    #[test]
    fn short_buffers_are_truncated() {
        for len in 0..HEADER_SIZE {
            let buf = vec![b'a'; len];
            assert!(matches!(
                peek_header(&buf),
                Err(EngineError::Truncated {
                    min: HEADER_SIZE,
                    ..
                })
            ));
        }
    }

    #[test]
    fn declared_size_past_end_is_rejected() {
        let mut buf = header(b"abc1", 5);
        buf.extend_from_slice(&[0; 4]);
        assert!(matches!(
            peek_header(&buf),
            Err(EngineError::StaticFieldsOverrun {
                declared: 5,
                remaining: 4,
            })
        ));

        let huge = header(b"abc1", u64::MAX);
        assert!(matches!(
            peek_header(&huge),
            Err(EngineError::StaticFieldsOverrun {
                declared: u64::MAX,
                remaining: 0,
            })
        ));
    }

    #[test]
    fn header_only_is_valid() {
        let buf = header(b"abc1", 0);
        let view = peek_header(&buf).unwrap();
        assert!(view.static_fields().is_empty());
        assert!(view.payload().is_empty());
    }

    #[test]
    fn magic_is_checked_lazily() {
        let buf = header(b"a\0bc", 0);
        let view = peek_header(&buf).unwrap();
        assert_eq!(view.raw_magic(), b"a\0bc");
        assert!(matches!(view.magic(), Err(EngineError::InvalidMagic(_))));
    }
}
