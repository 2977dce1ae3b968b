//! Realignment to the next record boundary.
//!
//! The decoder does not have to understand every field a record carries.
//! Whatever it leaves unread is skipped using the declared record length
//! alone, which is how new field types stay readable by old decoders.

use std::io::{Read, Seek};

use tracing::debug;

use crate::cursor::RecordCursor;
use crate::error::{Error, Result};

impl<R: Read + Seek> RecordCursor<R> {
    /// Read and return the bytes between the ledger and `declared`.
    ///
    /// On success the ledger equals `declared`. If the ledger is already past
    /// `declared` nothing is read and [`Error::OverconsumedRecord`] is
    /// returned; that situation is never corrected automatically.
    pub fn resync(&mut self, declared: u64) -> Result<Vec<u8>> {
        let consumed = self.consumed();
        if consumed > declared {
            return Err(Error::OverconsumedRecord { declared, consumed });
        }

        let gap = usize::try_from(declared - consumed)
            .map_err(|_| Error::short_read(usize::MAX, 0, consumed))?;
        debug!(declared, consumed, gap, "skipping to record boundary");

        let skipped = self.read_bytes(gap)?;
        self.set_consumed(declared);
        Ok(skipped)
    }
}
