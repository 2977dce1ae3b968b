//! Per-record byte accounting.

/// Running count of bytes consumed for the record being parsed.
///
/// A ledger is owned by one [`RecordCursor`](crate::RecordCursor) and is never
/// shared between records parsed in parallel. It is reset, not dropped,
/// between records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteLedger {
    consumed: u64,
}

impl ByteLedger {
    /// Creates a ledger starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger starting at `consumed`
    pub fn starting_at(consumed: u64) -> Self {
        Self { consumed }
    }

    /// Current consumed-byte count
    pub fn get(&self) -> u64 {
        self.consumed
    }

    /// Overwrite the count
    pub fn set(&mut self, value: u64) {
        self.consumed = value;
    }

    /// Add `delta` bytes
    pub fn increment(&mut self, delta: u64) {
        self.consumed = self.consumed.saturating_add(delta);
    }

    /// Reset to zero at the start of a record
    pub fn reset(&mut self) {
        self.consumed = 0;
    }

    // Only called once the matching seek has succeeded.
    pub(crate) fn decrement(&mut self, delta: u64) {
        self.consumed = self.consumed.saturating_sub(delta);
    }
}
