//! Magic-number scanning.
//!
//! Both scanners read the stream in 4-byte words, decode each word as a
//! little-endian u32 and stop at the first one equal to the configured
//! marker. The words are not realigned byte by byte; a marker straddling
//! two words is not found.

use std::io::{Read, Seek};

use tracing::{debug, trace, warn};

use crate::cursor::RecordCursor;
use crate::error::{Error, Result};
use crate::primitive::{self, ByteOrder};

/// How often a long scan reports progress
const PROGRESS_INTERVAL: usize = 10_000;

/// Outcome of a successful magic scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicScan {
    /// Number of 4-byte words read, the matching one included
    pub attempts: usize,
}

impl MagicScan {
    /// Total bytes read by the scan
    pub fn bytes(&self) -> u64 {
        self.attempts as u64 * 4
    }
}

impl<R: Read + Seek> RecordCursor<R> {
    /// Scan forward until the magic marker is found.
    ///
    /// Runs until it succeeds or the stream fails; the end of the stream
    /// surfaces as [`Error::ShortRead`] (see [`Error::is_end_of_stream`]).
    pub fn find_magic(&mut self) -> Result<MagicScan> {
        self.scan_magic(None)
    }

    /// Scan forward for the magic marker, giving up after
    /// [`DecoderConfig::max_magic_attempts`](crate::DecoderConfig::max_magic_attempts)
    /// words with [`Error::MagicNotFound`].
    pub fn find_magic_bounded(&mut self) -> Result<MagicScan> {
        let limit = self.config().max_magic_attempts;
        self.scan_magic(Some(limit))
    }

    fn scan_magic(&mut self, limit: Option<usize>) -> Result<MagicScan> {
        let magic = self.config().magic;
        let mut attempts = 0usize;

        loop {
            if limit.is_some_and(|limit| attempts >= limit) {
                warn!(attempts, magic, "giving up magic scan");
                return Err(Error::MagicNotFound {
                    attempts,
                    consumed: self.consumed(),
                });
            }

            let mut word = [0u8; 4];
            self.fill(&mut word)?;
            self.charge_scan(4);
            attempts += 1;

            let value = self.decoded(primitive::read_u32(&word, ByteOrder::Little))?;
            if value == magic {
                debug!(attempts, "found magic number");
                return Ok(MagicScan { attempts });
            }

            if attempts % PROGRESS_INTERVAL == 0 {
                trace!(attempts, "still scanning for magic number");
            }
        }
    }
}
