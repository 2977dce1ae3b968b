//! Per-record decoding session over a caller-owned stream.
//!
//! [`RecordCursor`] pairs a `Read + Seek` stream with a [`ByteLedger`]. Every
//! successful read charges the ledger with the bytes it advanced, and every
//! rewind takes them back once the seek has gone through, so at rest the
//! ledger always matches how far the stream has actually moved.
//!
//! The cursor is generic over the stream type; pass `&mut file` to keep
//! ownership on the caller's side.

use std::io::{self, Read, Seek, SeekFrom};

use tracing::trace;

use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::ledger::ByteLedger;
use crate::primitive::{self, ByteOrder};

/// A decoding session for one record at a time
#[derive(Debug)]
pub struct RecordCursor<R> {
    stream: R,
    ledger: ByteLedger,
    scanned: u64,
    config: DecoderConfig,
}

impl<R: Read + Seek> RecordCursor<R> {
    /// Creates a cursor with the default configuration
    pub fn new(stream: R) -> Self {
        Self::with_config(stream, DecoderConfig::default())
    }

    /// Creates a cursor with a custom configuration
    pub fn with_config(stream: R, config: DecoderConfig) -> Self {
        Self {
            stream,
            ledger: ByteLedger::new(),
            scanned: 0,
            config,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// The record ledger
    pub fn ledger(&self) -> &ByteLedger {
        &self.ledger
    }

    /// Bytes consumed for the current record
    pub fn consumed(&self) -> u64 {
        self.ledger.get()
    }

    /// Overwrite the record ledger, e.g. after a caller-side correction
    pub fn set_consumed(&mut self, value: u64) {
        self.ledger.set(value);
    }

    /// Charge `delta` extra bytes to the record ledger
    pub fn increment_consumed(&mut self, delta: u64) {
        self.ledger.increment(delta);
    }

    /// Start a new record at zero consumed bytes
    pub fn begin_record(&mut self) {
        self.ledger.reset();
    }

    /// Bytes read by magic scans under [`ScanAccounting::Separate`](crate::ScanAccounting::Separate)
    pub fn scanned(&self) -> u64 {
        self.scanned
    }

    /// Clear the scan counter
    pub fn reset_scanned(&mut self) {
        self.scanned = 0;
    }

    /// Borrow the underlying stream
    pub fn get_ref(&self) -> &R {
        &self.stream
    }

    /// Mutably borrow the underlying stream.
    ///
    /// Moving the stream behind the cursor's back desynchronizes the ledger.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.stream
    }

    /// Give the stream back to the caller
    pub fn into_inner(self) -> R {
        self.stream
    }

    /// Current absolute stream position
    pub fn position(&mut self) -> Result<u64> {
        let consumed = self.ledger.get();
        self.stream
            .stream_position()
            .map_err(|source| Error::Io { consumed, source })
    }

    /// Read exactly `n` bytes and charge them to the ledger.
    ///
    /// The buffer grows with what the stream delivers, so a corrupt length
    /// does not allocate more than the stream actually holds.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let read = (&mut self.stream).take(n as u64).read_to_end(&mut buf);
        if let Err(source) = read {
            let consumed = self.ledger.get();
            return Err(self.unread(buf.len(), Error::Io { consumed, source }));
        }

        if buf.len() < n {
            let err = Error::short_read(n, buf.len(), self.ledger.get());
            return Err(self.unread(buf.len(), err));
        }
        self.ledger.increment(n as u64);
        Ok(buf)
    }

    /// Read exactly `N` bytes into an array and charge them to the ledger.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        self.ledger.increment(N as u64);
        Ok(buf)
    }

    /// Move the stream back `n` bytes and take them off the ledger.
    ///
    /// `n` may not exceed the ledger; bytes from before the record (or
    /// scan bytes kept off the ledger) cannot be rewound over. If the seek
    /// fails the ledger is not touched.
    pub fn rewind(&mut self, n: u64) -> Result<()> {
        let consumed = self.ledger.get();
        if n > consumed {
            return Err(Error::RewindBeyondRecord {
                requested: n,
                consumed,
            });
        }
        self.seek_back(n)?;
        self.ledger.decrement(n);
        trace!(bytes = n, consumed = self.ledger.get(), "rewound stream");
        Ok(())
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let raw = self.read_array::<1>()?;
        self.decoded(primitive::read_u8(&raw))
    }

    /// Read a 16-bit integer in the given byte order.
    pub fn read_u16(&mut self, order: ByteOrder) -> Result<u16> {
        let raw = self.read_array::<2>()?;
        self.decoded(primitive::read_u16(&raw, order))
    }

    /// Read a 32-bit integer in the given byte order.
    pub fn read_u32(&mut self, order: ByteOrder) -> Result<u32> {
        let raw = self.read_array::<4>()?;
        self.decoded(primitive::read_u32(&raw, order))
    }

    /// Read a 64-bit integer in the given byte order.
    pub fn read_u64(&mut self, order: ByteOrder) -> Result<u64> {
        let raw = self.read_array::<8>()?;
        self.decoded(primitive::read_u64(&raw, order))
    }

    /// Read `n` bytes and return them hex encoded.
    pub fn read_hex(&mut self, n: usize) -> Result<String> {
        let raw = self.read_bytes(n)?;
        Ok(primitive::to_hex(&raw))
    }

    /// Step back over the last 5 bytes and re-read 4 of them as a
    /// little-endian u32.
    ///
    /// Used when a 4-byte field was read one byte too late. The net effect on
    /// both the stream and the ledger is one byte backwards.
    pub fn rewind_and_read_u32(&mut self) -> Result<(u32, [u8; 4])> {
        self.rewind(5)?;
        let raw = self.read_array::<4>()?;
        let value = self.decoded(primitive::read_u32(&raw, ByteOrder::Little))?;
        Ok((value, raw))
    }

    /// Step back over the last 8 bytes and re-read 7 of them, zero-extended
    /// to a little-endian u64.
    ///
    /// The returned raw bytes are the 7 bytes read plus the padding byte. The
    /// net effect on both the stream and the ledger is one byte backwards.
    pub fn rewind_and_read_u64(&mut self) -> Result<(u64, [u8; 8])> {
        self.rewind(8)?;
        let head = self.read_array::<7>()?;
        let mut raw = [0u8; 8];
        raw[..7].copy_from_slice(&head);
        let value = self.decoded(primitive::read_u64(&raw, ByteOrder::Little))?;
        Ok((value, raw))
    }

    /// Fill `buf` from the stream without touching the ledger.
    ///
    /// On a short read the partial bytes are seeked back over, so a failed
    /// read leaves the stream where it started.
    pub(crate) fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    let consumed = self.ledger.get();
                    return Err(self.unread(filled, Error::Io { consumed, source }));
                }
            }
        }

        if filled < buf.len() {
            let err = Error::short_read(buf.len(), filled, self.ledger.get());
            return Err(self.unread(filled, err));
        }
        Ok(())
    }

    /// Undo a partial read of `filled` bytes, then hand back `err`.
    ///
    /// If the stream refuses to move back, the partial bytes are charged to
    /// the ledger instead and the seek failure is returned.
    fn unread(&mut self, filled: usize, err: Error) -> Error {
        if filled == 0 {
            return err;
        }
        match self.seek_back(filled as u64) {
            Ok(()) => err,
            Err(seek) => {
                self.ledger.increment(filled as u64);
                seek
            }
        }
    }

    /// Charge scan bytes according to the configured accounting policy.
    pub(crate) fn charge_scan(&mut self, n: u64) {
        match self.config.scan_accounting {
            crate::ScanAccounting::Record => self.ledger.increment(n),
            crate::ScanAccounting::Separate => self.scanned += n,
        }
    }

    fn seek_back(&mut self, n: u64) -> Result<()> {
        let consumed = self.ledger.get();
        let delta = i64::try_from(n).map(|n| -n).map_err(|_| Error::Seek {
            delta: i64::MIN,
            consumed,
            source: io::Error::new(io::ErrorKind::InvalidInput, "rewind distance too large"),
        })?;
        self.stream
            .seek(SeekFrom::Current(delta))
            .map(|_| ())
            .map_err(|source| Error::Seek {
                delta,
                consumed,
                source,
            })
    }

    pub(crate) fn decoded<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|e| Error::decode(self.ledger.get(), e))
    }
}
