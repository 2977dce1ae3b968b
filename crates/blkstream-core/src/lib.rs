//! # blkstream-core
//!
//! A cursor-based decoder for magic-delimited, length-prefixed record
//! streams, laid out like Bitcoin `blk*.dat` files.
//!
//! This crate provides:
//! - Fixed-width integer decoding in both byte orders, plus hex formatting
//! - CompactSize variable-length integers, from a stream or a buffer
//! - Scanning a stream for the magic marker that starts each record
//! - A per-record byte ledger and resynchronization to the next record
//!
//! Record contents (transactions, scripts) are never interpreted.
//!
//! ## Architecture
//!
//! - [`primitive`]: fixed-width and hex decoders over byte slices
//! - [`ledger`]: the [`ByteLedger`] consumed-byte counter
//! - [`cursor`]: [`RecordCursor`], a decoding session over a caller's stream
//! - [`compact`]: CompactSize decoding in three call shapes
//! - [`magic`]: bounded and unbounded magic-number scans
//! - [`resync`]: skipping to the declared end of a record
//! - [`records`]: [`RecordReader`], iterating raw records of a file
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use blkstream_core::{ByteOrder, RecordCursor};
//! use std::fs::File;
//!
//! let mut file = File::open("blk00000.dat")?;
//! let mut cursor = RecordCursor::new(&mut file);
//!
//! cursor.find_magic_bounded()?;
//! let declared = cursor.read_u32(ByteOrder::Little)?;
//!
//! cursor.begin_record();
//! let version = cursor.read_u32(ByteOrder::Little)?;
//! let previous = cursor.read_bytes(32)?;
//!
//! // Skip whatever was not decoded.
//! let rest = cursor.resync(u64::from(declared))?;
//! println!("version {version}, {} bytes skipped", rest.len());
//! # let _ = previous;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod compact;
pub mod config;
pub mod cursor;
pub mod error;
pub mod ledger;
pub mod magic;
pub mod primitive;
pub mod records;
pub mod resync;

// Re-export primary types for convenience
pub use compact::{decode_compact_size_at, CompactSize};
pub use config::{DecoderConfig, ScanAccounting};
pub use cursor::RecordCursor;
pub use error::{Error, Result};
pub use ledger::ByteLedger;
pub use magic::MagicScan;
pub use primitive::ByteOrder;
pub use records::{open_file, open_file_with_config, RawRecord, RecordReader};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Record start marker, `F9 BE B4 D9` on the wire
pub const MAGIC: u32 = 0xD9B4_BEF9;

/// Smallest first byte that starts a multi-byte CompactSize
pub const COMPACT_U16_MARKER: u8 = 0xFD;

/// 2-byte CompactSize payload that extends the encoding to 4 payload bytes
pub const COMPACT_U16_SENTINEL: u16 = 0xFFFF;

/// 4-byte CompactSize payload that extends the encoding to 8 payload bytes
pub const COMPACT_U32_SENTINEL: u32 = 0xFFFF_FFFF;

/// Default word budget of the bounded magic scan
pub const DEFAULT_MAX_MAGIC_ATTEMPTS: usize = 50_000;
