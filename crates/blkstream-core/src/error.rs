//! Error types for the blkstream-core library.
//!
//! Every failure that can happen while a record is being decoded carries the
//! ledger value observed at that point (`consumed`), so a caller can decide
//! whether to abort the stream or skip ahead to the next magic marker.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for blkstream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all decoding operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A primitive decoder was handed fewer bytes than its width
    #[error("short buffer: need {needed} bytes, got {actual}")]
    ShortBuffer {
        /// Width required by the decoder
        needed: usize,
        /// Length of the slice actually supplied
        actual: usize,
    },

    /// The stream ran out before a read could be satisfied
    #[error("short read: requested {requested} bytes, {available} available (ledger at {consumed})")]
    ShortRead {
        /// Number of bytes requested
        requested: usize,
        /// Number of bytes the stream could still provide
        available: usize,
        /// Ledger value when the read failed
        consumed: u64,
    },

    /// A primitive decode step failed inside a stream operation
    #[error("decode failed (ledger at {consumed}): {source}")]
    Decode {
        /// Ledger value when decoding failed
        consumed: u64,
        /// The primitive failure
        #[source]
        source: Box<Error>,
    },

    /// The bounded magic scan used its whole attempt budget
    #[error("magic number not found after {attempts} attempts (ledger at {consumed})")]
    MagicNotFound {
        /// Number of 4-byte words read
        attempts: usize,
        /// Ledger value when the scan gave up
        consumed: u64,
    },

    /// More bytes were consumed than the record declared
    #[error("used more bytes than the record declares: consumed {consumed}, declared {declared}")]
    OverconsumedRecord {
        /// Declared record length
        declared: u64,
        /// Ledger value
        consumed: u64,
    },

    /// A slice did not have the exact length a fixed-size field needs
    #[error("length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Required length
        expected: usize,
        /// Length of the slice actually supplied
        actual: usize,
    },

    /// A rewind asked to move back past the start of the record
    #[error("cannot rewind {requested} bytes with only {consumed} consumed")]
    RewindBeyondRecord {
        /// Requested rewind distance
        requested: u64,
        /// Ledger value, unchanged
        consumed: u64,
    },

    /// Moving the stream cursor backwards failed.
    ///
    /// After a failed rewind the ledger is unchanged. After a failed undo of a
    /// partial read the ledger has been charged with the partial bytes, so it
    /// still matches the stream.
    #[error("failed to seek by {delta} bytes (ledger at {consumed}): {source}")]
    Seek {
        /// Requested relative move
        delta: i64,
        /// Ledger value when the seek was attempted
        consumed: u64,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Any other stream failure
    #[error("stream error (ledger at {consumed}): {source}")]
    Io {
        /// Ledger value when the error surfaced
        consumed: u64,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Failed to open or read an input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Creates a new short buffer error
    pub fn short_buffer(needed: usize, actual: usize) -> Self {
        Self::ShortBuffer { needed, actual }
    }

    /// Creates a new short read error
    pub fn short_read(requested: usize, available: usize, consumed: u64) -> Self {
        Self::ShortRead {
            requested,
            available,
            consumed,
        }
    }

    /// Wraps a primitive failure with the ledger value at which it happened
    pub fn decode(consumed: u64, source: Error) -> Self {
        Self::Decode {
            consumed,
            source: Box::new(source),
        }
    }

    /// Creates a new length mismatch error
    pub fn length_mismatch(expected: usize, actual: usize) -> Self {
        Self::LengthMismatch { expected, actual }
    }

    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Returns the ledger value recorded with this error, if any
    pub fn consumed(&self) -> Option<u64> {
        match self {
            Self::ShortRead { consumed, .. }
            | Self::Decode { consumed, .. }
            | Self::MagicNotFound { consumed, .. }
            | Self::OverconsumedRecord { consumed, .. }
            | Self::RewindBeyondRecord { consumed, .. }
            | Self::Seek { consumed, .. }
            | Self::Io { consumed, .. } => Some(*consumed),
            Self::ShortBuffer { .. } | Self::LengthMismatch { .. } | Self::FileRead { .. } => None,
        }
    }

    /// Returns true if the stream was already exhausted when the read began.
    ///
    /// During a magic scan this usually means "no more records" rather than
    /// corrupt input; the caller makes that call.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::ShortRead { available: 0, .. })
    }

    /// Returns true if skipping to the next magic marker is a sensible reaction
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::OverconsumedRecord { .. } | Self::ShortBuffer { .. }
        )
    }
}
