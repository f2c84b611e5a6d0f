//! Per-process event sequence numbers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic sequence counter owned by one event writer.
///
/// Values are only comparable within the lifetime of the process that
/// produced them; a new counter starts again at 1.
#[derive(Debug, Default)]
pub struct SequenceCounter(AtomicU64);

impl SequenceCounter {
    /// Create a counter whose first value is 1.
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Take the next sequence number.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst).saturating_add(1)
    }

    /// Last value handed out (0 if none).
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}
