//! Decoder configuration.

use crate::{DEFAULT_MAX_MAGIC_ATTEMPTS, MAGIC};

/// Where the bytes read while hunting for a magic marker are charged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanAccounting {
    /// Keep scan bytes in a counter of their own, outside the record ledger
    #[default]
    Separate,
    /// Charge scan bytes to the record ledger
    Record,
}

/// Configuration shared by every operation on a [`RecordCursor`](crate::RecordCursor)
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Record start marker, compared after little-endian decoding
    pub magic: u32,
    /// Maximum number of 4-byte words the bounded scan reads
    pub max_magic_attempts: usize,
    /// Ledger policy for scan bytes
    pub scan_accounting: ScanAccounting,
    /// Whether record iteration uses the bounded scan
    pub bounded_scan: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            max_magic_attempts: DEFAULT_MAX_MAGIC_ATTEMPTS,
            scan_accounting: ScanAccounting::default(),
            bounded_scan: true,
        }
    }
}

impl DecoderConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the record start marker
    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    /// Sets the bounded scan attempt cap
    pub fn max_magic_attempts(mut self, attempts: usize) -> Self {
        self.max_magic_attempts = attempts;
        self
    }

    /// Sets the ledger policy for scan bytes
    pub fn scan_accounting(mut self, accounting: ScanAccounting) -> Self {
        self.scan_accounting = accounting;
        self
    }

    /// Sets whether record iteration uses the bounded scan
    pub fn bounded_scan(mut self, bounded: bool) -> Self {
        self.bounded_scan = bounded;
        self
    }
}
