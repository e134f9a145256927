use std::sync::atomic::{AtomicU64, Ordering};

/// Counters recorded by an object store backend.
///
/// Backends receive an `Arc<StoreMetrics>` at construction so callers can
/// share one set of counters across stores or read them after a run.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    writes: AtomicU64,
    dedup_hits: AtomicU64,
    reads: AtomicU64,
    misses: AtomicU64,
    bytes_written: AtomicU64,
}

/// A point-in-time copy of [`StoreMetrics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub writes: u64,
    pub dedup_hits: u64,
    pub reads: u64,
    pub misses: u64,
    pub bytes_written: u64,
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_write(&self, bytes: u64) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_dedup(&self) {
        self.dedup_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self, hit: bool) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if !hit {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            writes: self.writes.load(Ordering::Relaxed),
            dedup_hits: self.dedup_hits.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }
}
