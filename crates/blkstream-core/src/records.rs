//! Record iteration over a whole block file.
//!
//! Each record on the wire is laid out as:
//!
//! ```text
//! [magic: u32 LE] [length: u32 LE] [body: length bytes]
//! ```
//!
//! [`RecordReader`] scans for the marker, reads the length field and then
//! lets the resynchronizer pull in the body. Bodies are returned as opaque
//! bytes.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::debug;

use crate::config::DecoderConfig;
use crate::cursor::RecordCursor;
use crate::error::{Error, Result};
use crate::primitive::ByteOrder;

const MAGIC_WIDTH: usize = 4;

/// One record as found in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Stream position of the record's magic marker
    pub offset: u64,
    /// Length declared in the record header
    pub declared_len: u32,
    /// The record body, `declared_len` bytes
    pub body: Vec<u8>,
    /// Bytes read while looking for the marker, the marker included
    pub scanned: u64,
}

/// Iterator over the records of a stream
#[derive(Debug)]
pub struct RecordReader<R> {
    cursor: RecordCursor<R>,
    finished: bool,
}

impl<R: Read + Seek> RecordReader<R> {
    /// Creates a reader with the default configuration
    pub fn new(stream: R) -> Self {
        Self::with_config(stream, DecoderConfig::default())
    }

    /// Creates a reader with a custom configuration
    pub fn with_config(stream: R, config: DecoderConfig) -> Self {
        Self {
            cursor: RecordCursor::with_config(stream, config),
            finished: false,
        }
    }

    /// The underlying decoding session
    pub fn cursor(&self) -> &RecordCursor<R> {
        &self.cursor
    }

    /// Give the stream back to the caller
    pub fn into_inner(self) -> R {
        self.cursor.into_inner()
    }

    fn scan(&mut self) -> Result<u64> {
        let scan = if self.cursor.config().bounded_scan {
            self.cursor.find_magic_bounded()?
        } else {
            self.cursor.find_magic()?
        };
        Ok(scan.bytes())
    }

    fn read_record(&mut self, scanned: u64) -> Result<RawRecord> {
        let offset = self.cursor.position()?.saturating_sub(MAGIC_WIDTH as u64);

        let declared_len = self.cursor.read_u32(ByteOrder::Little)?;
        self.cursor.begin_record();
        let body = self.cursor.resync(u64::from(declared_len))?;

        debug!(offset, declared_len, scanned, "read record");
        Ok(RawRecord {
            offset,
            declared_len,
            body,
            scanned,
        })
    }
}

impl<R: Read + Seek> Iterator for RecordReader<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let scanned = match self.scan() {
            Ok(scanned) => scanned,
            // Fewer than four bytes left cannot hold another marker; that is
            // trailing padding, not a damaged record.
            Err(Error::ShortRead { available, .. }) if available < MAGIC_WIDTH => {
                debug!(trailing = available, "end of stream");
                self.finished = true;
                return None;
            }
            // A failed bounded scan can be resumed from where it stopped.
            Err(e @ Error::MagicNotFound { .. }) => return Some(Err(e)),
            Err(e) => {
                self.finished = true;
                return Some(Err(e));
            }
        };

        let record = self.read_record(scanned);
        if record.is_err() {
            self.finished = true;
        }
        Some(record)
    }
}

/// Open a file for record iteration
pub fn open_file(path: impl AsRef<Path>) -> Result<RecordReader<BufReader<File>>> {
    open_file_with_config(path, DecoderConfig::default())
}

/// Open a file for record iteration with custom configuration
pub fn open_file_with_config(
    path: impl AsRef<Path>,
    config: DecoderConfig,
) -> Result<RecordReader<BufReader<File>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::file_read(path, e))?;
    Ok(RecordReader::with_config(BufReader::new(file), config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAGIC;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};

    fn record(body: &[u8]) -> Vec<u8> {
        let mut out = MAGIC.to_le_bytes().to_vec();
        out.extend((body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_walks_records() {
        let mut data = vec![0u8; 8];
        data.extend(record(b"hello"));
        data.extend(record(b""));

        let records: Vec<_> = RecordReader::new(Cursor::new(data))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(
            records,
            vec![
                RawRecord {
                    offset: 8,
                    declared_len: 5,
                    body: b"hello".to_vec(),
                    scanned: 12,
                },
                RawRecord {
                    offset: 21,
                    declared_len: 0,
                    body: Vec::new(),
                    scanned: 4,
                },
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(RecordReader::new(Cursor::new(Vec::new())).count(), 0);
    }

    #[test]
    fn test_zero_padding_after_last_record() {
        for padding in [1, 3, 5, 8, 4096] {
            let mut data = record(b"abc");
            data.extend(vec![0u8; padding]);

            let records: Vec<_> = RecordReader::new(Cursor::new(data))
                .collect::<Result<_>>()
                .unwrap();
            assert_eq!(records.len(), 1, "padding of {padding} bytes");
            assert_eq!(records[0].body, b"abc".to_vec());
        }
    }

    #[test]
    fn test_truncated_record_stops_iteration() {
        let mut data = record(b"abc");
        data.extend(MAGIC.to_le_bytes());
        data.extend(10u32.to_le_bytes());
        data.extend(b"short");

        let mut reader = RecordReader::new(Cursor::new(data));
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(
            reader.next(),
            Some(Err(Error::ShortRead {
                requested: 10,
                available: 5,
                ..
            }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_missing_length_field_is_an_error() {
        let mut reader = RecordReader::new(Cursor::new(MAGIC.to_le_bytes().to_vec()));
        assert!(matches!(
            reader.next(),
            Some(Err(Error::ShortRead { available: 0, .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_bounded_scan_resumes() {
        let mut data = vec![0u8; 4 * 3];
        data.extend(record(b"x"));
        let config = DecoderConfig::new().max_magic_attempts(2);
        let mut reader = RecordReader::with_config(Cursor::new(data), config);

        assert!(matches!(
            reader.next(),
            Some(Err(Error::MagicNotFound { attempts: 2, .. }))
        ));
        let record = reader.next().unwrap().unwrap();
        assert_eq!(record.offset, 12);
        assert_eq!(record.body, b"x".to_vec());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&record(&[0xAA; 90])).unwrap();
        file.flush().unwrap();

        let records: Vec<_> = open_file(file.path()).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].declared_len, 90);
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(
            open_file("/nonexistent/blk00000.dat"),
            Err(Error::FileRead { .. })
        ));
    }
}
