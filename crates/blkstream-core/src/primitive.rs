//! Fixed-width integer and hex decoding.
//!
//! Each decoder reads the leading `N` bytes of a slice. A slice shorter than
//! `N` is an error; there is no zero padding and no truncation.

use crate::error::{Error, Result};

/// Length of a block or transaction hash on the wire
pub const HASH_LEN: usize = 32;

/// Byte order selector for the multi-byte decoders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Least significant byte first (the wire default)
    #[default]
    Little,
    /// Most significant byte first
    Big,
}

fn leading<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes
        .get(..N)
        .and_then(|head| head.try_into().ok())
        .ok_or_else(|| Error::short_buffer(N, bytes.len()))
}

/// Decode a single unsigned byte.
pub fn read_u8(bytes: &[u8]) -> Result<u8> {
    let [b] = leading::<1>(bytes)?;
    Ok(b)
}

/// Decode an unsigned 16-bit integer.
pub fn read_u16(bytes: &[u8], order: ByteOrder) -> Result<u16> {
    let raw = leading::<2>(bytes)?;
    Ok(match order {
        ByteOrder::Little => u16::from_le_bytes(raw),
        ByteOrder::Big => u16::from_be_bytes(raw),
    })
}

/// Decode an unsigned 32-bit integer.
pub fn read_u32(bytes: &[u8], order: ByteOrder) -> Result<u32> {
    let raw = leading::<4>(bytes)?;
    Ok(match order {
        ByteOrder::Little => u32::from_le_bytes(raw),
        ByteOrder::Big => u32::from_be_bytes(raw),
    })
}

/// Decode an unsigned 64-bit integer.
pub fn read_u64(bytes: &[u8], order: ByteOrder) -> Result<u64> {
    let raw = leading::<8>(bytes)?;
    Ok(match order {
        ByteOrder::Little => u64::from_le_bytes(raw),
        ByteOrder::Big => u64::from_be_bytes(raw),
    })
}

/// Copy a byte slice into an owned vector of byte values.
pub fn read_u8_array(bytes: &[u8]) -> Vec<u8> {
    bytes.to_vec()
}

/// Lowercase hex of an arbitrary byte slice.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Lowercase hex of a fixed-length hash field, in wire order.
///
/// `bytes` must be exactly `len` long (usually [`HASH_LEN`]); a shorter or
/// longer slice is rejected rather than padded or cut.
pub fn hash_to_hex(bytes: &[u8], len: usize) -> Result<String> {
    if bytes.len() != len {
        return Err(Error::length_mismatch(len, bytes.len()));
    }
    Ok(hex::encode(bytes))
}

/// Lowercase hex with the byte order reversed.
///
/// Block explorers print hashes this way.
pub fn reversed_hex(bytes: &[u8]) -> String {
    let mut reversed = bytes.to_vec();
    reversed.reverse();
    hex::encode(reversed)
}
