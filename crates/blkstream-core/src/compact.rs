//! CompactSize variable-length integers.
//!
//! ## Encoding
//!
//! The first byte `b0` selects the width:
//!
//! | Condition                                   | Value           | Width |
//! |---------------------------------------------|-----------------|-------|
//! | `b0 < 0xFD`                                 | `b0`            | 1     |
//! | next 2 bytes (LE) `< 0xFFFF`                | those 2 bytes   | 3     |
//! | next 4 bytes (LE) `< 0xFFFF_FFFF`           | those 4 bytes   | 5     |
//! | otherwise                                   | next 8 bytes    | 9     |
//!
//! Any marker byte from `0xFD` up enters the long form; the payload itself
//! decides how far it extends. The payload always starts right after the
//! marker, so each longer form re-reads the bytes of the shorter one.
//!
//! Three call shapes are provided:
//!
//! - [`RecordCursor::read_compact_size_with_backup`] rewinds over the marker
//!   and re-reads marker plus payload in one go, returning the whole encoding
//! - [`RecordCursor::read_compact_size`] only reads forward and returns the
//!   payload bytes without the marker
//! - [`decode_compact_size_at`] works on an in-memory buffer and returns the
//!   offset just past the encoding
//!
//! Every successful decode charges the ledger with the full width.

use std::io::{Read, Seek};

use tracing::trace;

use crate::cursor::RecordCursor;
use crate::error::{Error, Result};
use crate::ledger::ByteLedger;
use crate::primitive::{self, ByteOrder};
use crate::{COMPACT_U16_MARKER, COMPACT_U16_SENTINEL, COMPACT_U32_SENTINEL};

/// A CompactSize decoded from a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactSize {
    /// Decoded value
    pub value: u64,
    /// Raw bytes as returned by the decoding variant
    pub raw: Vec<u8>,
    /// Bytes the stream advanced, i.e. the encoded width
    pub advanced: usize,
}

impl CompactSize {
    fn new(value: u64, raw: Vec<u8>, advanced: usize) -> Self {
        trace!(value, width = advanced, "decoded compact size");
        Self {
            value,
            raw,
            advanced,
        }
    }
}

impl<R: Read + Seek> RecordCursor<R> {
    /// Decode a CompactSize, returning the marker and payload together.
    ///
    /// After a long-form marker the stream is rewound and the whole encoding
    /// is read again at each width it grows to. The ledger ends up charged
    /// with exactly the encoded width.
    pub fn read_compact_size_with_backup(&mut self) -> Result<CompactSize> {
        let [marker] = self.read_array::<1>()?;
        if marker < COMPACT_U16_MARKER {
            return Ok(CompactSize::new(u64::from(marker), vec![marker], 1));
        }

        self.rewind(1)?;
        let raw = self.read_bytes(3)?;
        let v16 = self.decoded(primitive::read_u16(&raw[1..], ByteOrder::Little))?;
        if v16 < COMPACT_U16_SENTINEL {
            return Ok(CompactSize::new(u64::from(v16), raw, 3));
        }

        self.rewind(3)?;
        let raw = self.read_bytes(5)?;
        let v32 = self.decoded(primitive::read_u32(&raw[1..], ByteOrder::Little))?;
        if v32 < COMPACT_U32_SENTINEL {
            return Ok(CompactSize::new(u64::from(v32), raw, 5));
        }

        self.rewind(5)?;
        let raw = self.read_bytes(9)?;
        let v64 = self.decoded(primitive::read_u64(&raw[1..], ByteOrder::Little))?;
        Ok(CompactSize::new(v64, raw, 9))
    }

    /// Decode a CompactSize reading strictly forward.
    ///
    /// `raw` holds the single byte for the short form and only the payload
    /// (2, 4 or 8 bytes, marker excluded) for the long forms.
    pub fn read_compact_size(&mut self) -> Result<CompactSize> {
        let [marker] = self.read_array::<1>()?;
        if marker < COMPACT_U16_MARKER {
            return Ok(CompactSize::new(u64::from(marker), vec![marker], 1));
        }

        let mut payload = self.read_bytes(2)?;
        let v16 = self.decoded(primitive::read_u16(&payload, ByteOrder::Little))?;
        if v16 < COMPACT_U16_SENTINEL {
            return Ok(CompactSize::new(u64::from(v16), payload, 3));
        }

        payload.extend(self.read_bytes(2)?);
        let v32 = self.decoded(primitive::read_u32(&payload, ByteOrder::Little))?;
        if v32 < COMPACT_U32_SENTINEL {
            return Ok(CompactSize::new(u64::from(v32), payload, 5));
        }

        payload.extend(self.read_bytes(4)?);
        let v64 = self.decoded(primitive::read_u64(&payload, ByteOrder::Little))?;
        Ok(CompactSize::new(v64, payload, 9))
    }

    /// Decode a CompactSize from `buf` at `start`, charging this cursor's
    /// ledger. See [`decode_compact_size_at`].
    pub fn decode_compact_size_at(&mut self, buf: &[u8], start: usize) -> Result<(u64, usize)> {
        let mut ledger = *self.ledger();
        let decoded = decode_compact_size_at(buf, start, &mut ledger)?;
        self.set_consumed(ledger.get());
        Ok(decoded)
    }
}

/// Decode a CompactSize from an in-memory buffer.
///
/// Returns the value and the offset of the first byte after the encoding.
/// No stream is involved; a buffer too short for the width announced by its
/// own bytes yields [`Error::Decode`] and leaves `ledger` untouched.
pub fn decode_compact_size_at(
    buf: &[u8],
    start: usize,
    ledger: &mut ByteLedger,
) -> Result<(u64, usize)> {
    let consumed = ledger.get();
    let at = |offset: usize| buf.get(offset..).unwrap_or(&[]);
    let wrap = |e: Error| Error::decode(consumed, e);

    let marker = primitive::read_u8(at(start)).map_err(wrap)?;
    let (value, width) = if marker < COMPACT_U16_MARKER {
        (u64::from(marker), 1)
    } else {
        let payload = at(start.saturating_add(1));
        let v16 = primitive::read_u16(payload, ByteOrder::Little).map_err(wrap)?;
        if v16 < COMPACT_U16_SENTINEL {
            (u64::from(v16), 3)
        } else {
            let v32 = primitive::read_u32(payload, ByteOrder::Little).map_err(wrap)?;
            if v32 < COMPACT_U32_SENTINEL {
                (u64::from(v32), 5)
            } else {
                (primitive::read_u64(payload, ByteOrder::Little).map_err(wrap)?, 9)
            }
        }
    };

    ledger.increment(width as u64);
    trace!(value, width, start, "decoded compact size from buffer");
    Ok((value, start + width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::tests::NoSeek;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::io::Cursor;

    /// Encoding that the decoder maps back to `value`, for values that have one
    fn encode(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        if value < 0xFD {
            out.push(value as u8);
        } else if value < 0xFFFF {
            out.push(0xFD);
            out.extend((value as u16).to_le_bytes());
        } else if value < 0xFFFF_FFFF {
            out.push(0xFE);
            out.extend((value as u32).to_le_bytes());
        } else {
            out.push(0xFF);
            out.extend(value.to_le_bytes());
        }
        out
    }

    fn cursor(data: Vec<u8>) -> RecordCursor<Cursor<Vec<u8>>> {
        RecordCursor::new(Cursor::new(data))
    }

    fn decode_all_ways(bytes: &[u8]) -> (CompactSize, CompactSize, (u64, usize)) {
        let backup = cursor(bytes.to_vec()).read_compact_size_with_backup().unwrap();
        let forward = cursor(bytes.to_vec()).read_compact_size().unwrap();
        let mut ledger = ByteLedger::new();
        let buffered = decode_compact_size_at(bytes, 0, &mut ledger).unwrap();
        assert_eq!(ledger.get() as usize, buffered.1);
        (backup, forward, buffered)
    }

    #[test]
    fn test_single_byte() {
        let mut c = cursor(vec![0xFC, 0x00]);
        let decoded = c.read_compact_size_with_backup().unwrap();
        assert_eq!(decoded, CompactSize { value: 0xFC, raw: vec![0xFC], advanced: 1 });
        assert_eq!(c.consumed(), 1);
        assert_eq!(c.position().unwrap(), 1);
    }

    #[test]
    fn test_three_byte_form_raw_shapes() {
        let data = vec![0xFD, 0x00, 0x01, 0xAA];

        let mut c = cursor(data.clone());
        let backup = c.read_compact_size_with_backup().unwrap();
        assert_eq!(backup.value, 256);
        assert_eq!(backup.raw, vec![0xFD, 0x00, 0x01]);
        assert_eq!(c.consumed(), 3);
        assert_eq!(c.position().unwrap(), 3);

        let mut c = cursor(data);
        let forward = c.read_compact_size().unwrap();
        assert_eq!(forward.value, 256);
        assert_eq!(forward.raw, vec![0x00, 0x01]);
        assert_eq!(c.consumed(), 3);
        assert_eq!(c.position().unwrap(), 3);
    }

    #[test]
    fn test_buffer_offset_decode() {
        let mut ledger = ByteLedger::new();
        let (value, next) = decode_compact_size_at(&[0xFD, 0x00, 0x01, 0x07], 0, &mut ledger).unwrap();
        assert_eq!((value, next), (256, 3));
        assert_eq!(ledger.get(), 3);

        let (value, next) = decode_compact_size_at(&[0xFD, 0x00, 0x01, 0x07], 3, &mut ledger).unwrap();
        assert_eq!((value, next), (7, 4));
        assert_eq!(ledger.get(), 4);
    }

    #[test]
    fn test_0xffff_falls_through_to_five_bytes() {
        let bytes = [0xFE, 0xFF, 0xFF, 0x00, 0x00];
        let (backup, forward, buffered) = decode_all_ways(&bytes);
        assert_eq!(backup.value, 0xFFFF);
        assert_eq!(backup.advanced, 5);
        assert_eq!(backup.raw, bytes.to_vec());
        assert_eq!(forward.value, 0xFFFF);
        assert_eq!(forward.raw, bytes[1..].to_vec());
        assert_eq!(buffered, (0xFFFF, 5));
    }

    #[test]
    fn test_0xffffffff_falls_through_to_nine_bytes() {
        let bytes = encode(0xFFFF_FFFF);
        assert_eq!(bytes.len(), 9);
        let (backup, forward, buffered) = decode_all_ways(&bytes);
        assert_eq!(backup.value, 0xFFFF_FFFF);
        assert_eq!(backup.advanced, 9);
        assert_eq!(forward.raw.len(), 8);
        assert_eq!(buffered, (0xFFFF_FFFF, 9));
    }

    #[test]
    fn test_max_value() {
        let (backup, forward, buffered) = decode_all_ways(&encode(u64::MAX));
        assert_eq!(backup.value, u64::MAX);
        assert_eq!(forward.value, u64::MAX);
        assert_eq!(buffered, (u64::MAX, 9));
    }

    #[test]
    fn test_truncated_stream_is_short_read() {
        let mut c = cursor(vec![0xFD, 0xFF, 0xFF, 0x01]);
        let err = c.read_compact_size_with_backup().unwrap_err();
        assert!(matches!(err, Error::ShortRead { requested: 5, available: 4, .. }));
        assert_eq!(c.consumed(), 0);
        assert_eq!(c.position().unwrap(), 0);

        let mut c = cursor(vec![0xFD, 0x01]);
        let err = c.read_compact_size().unwrap_err();
        assert!(matches!(err, Error::ShortRead { requested: 2, available: 1, consumed: 1 }));
        assert_eq!(c.position().unwrap(), 1);
    }

    #[test]
    fn test_truncated_buffer_is_decode_error() {
        let mut ledger = ByteLedger::starting_at(10);
        let err = decode_compact_size_at(&[0xFD, 0x01], 0, &mut ledger).unwrap_err();
        assert!(matches!(err, Error::Decode { consumed: 10, .. }));
        assert_eq!(ledger.get(), 10);

        assert!(decode_compact_size_at(&[0x01], 5, &mut ledger).is_err());
    }

    #[test]
    fn test_backup_with_failed_seek_keeps_ledger() {
        let mut c = RecordCursor::new(NoSeek(Cursor::new(vec![0xFD, 0x00, 0x01])));
        assert!(matches!(
            c.read_compact_size_with_backup(),
            Err(Error::Seek { delta: -1, consumed: 1, .. })
        ));
        assert_eq!(c.consumed(), 1);
        assert_eq!(c.get_ref().0.position(), 1);
    }

    #[test]
    fn test_cursor_buffer_decode_charges_ledger() {
        let mut c = cursor(Vec::new());
        c.set_consumed(4);
        assert_eq!(c.decode_compact_size_at(&[0x10], 0).unwrap(), (0x10, 1));
        assert_eq!(c.consumed(), 5);
    }

    proptest! {
        #[test]
        fn prop_one_byte_values(value in 0u64..=0xFC) {
            let (backup, forward, buffered) = decode_all_ways(&encode(value));
            prop_assert_eq!(backup.value, value);
            prop_assert_eq!(backup.advanced, 1);
            prop_assert_eq!(forward.advanced, 1);
            prop_assert_eq!(buffered, (value, 1));
        }

        #[test]
        fn prop_three_byte_values(value in 0xFDu64..=0xFFFE) {
            let bytes = encode(value);
            let (backup, forward, buffered) = decode_all_ways(&bytes);
            prop_assert_eq!(backup.value, value);
            prop_assert_eq!(&backup.raw, &bytes);
            prop_assert_eq!(forward.value, value);
            prop_assert_eq!(&forward.raw[..], &bytes[1..]);
            prop_assert_eq!(buffered, (value, 3));
        }

        #[test]
        fn prop_five_byte_values(high in 0u64..0xFFFF) {
            let value = (high << 16) | 0xFFFF;
            let (backup, forward, buffered) = decode_all_ways(&encode(value));
            prop_assert_eq!(backup.value, value);
            prop_assert_eq!(backup.advanced, 5);
            prop_assert_eq!(forward.value, value);
            prop_assert_eq!(buffered, (value, 5));
        }

        #[test]
        fn prop_nine_byte_values(high in any::<u32>()) {
            let value = (u64::from(high) << 32) | 0xFFFF_FFFF;
            let (backup, forward, buffered) = decode_all_ways(&encode(value));
            prop_assert_eq!(backup.value, value);
            prop_assert_eq!(backup.advanced, 9);
            prop_assert_eq!(forward.value, value);
            prop_assert_eq!(buffered, (value, 9));
        }

        #[test]
        fn prop_ledger_matches_position(bytes in proptest::collection::vec(any::<u8>(), 0..16)) {
            let mut c = cursor(bytes.clone());
            let _ = c.read_compact_size_with_backup();
            prop_assert_eq!(c.consumed(), c.position().unwrap());

            let mut c = cursor(bytes);
            let _ = c.read_compact_size();
            prop_assert_eq!(c.consumed(), c.position().unwrap());
        }
    }
}
