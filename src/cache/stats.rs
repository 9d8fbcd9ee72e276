//! Cache Statistics Module
//!
//! Tracks lookups and sweep activity with lock-free counters.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Reads that found a fresh entry
    pub hits: u64,
    /// Reads that found nothing
    pub misses: u64,
    /// Reads that found an entry past its TTL
    pub expired_reads: u64,
    /// Completed expiry sweeps (scheduled and explicit)
    pub sweeps: u64,
    /// Entries removed by sweeps
    pub swept_entries: u64,
    /// Wall-clock time the last sweep finished
    pub last_sweep_at: Option<DateTime<Utc>>,
    /// Physically present entries when the snapshot was taken
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Expired reads count as misses. Returns 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.expired_reads;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Shared counters behind [`CacheStats`].
#[derive(Debug)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    expired_reads: AtomicU64,
    sweeps: AtomicU64,
    swept_entries: AtomicU64,
    /// Unix milliseconds of the last sweep, `NO_SWEEP` if none ran yet
    last_sweep_ms: AtomicI64,
}

const NO_SWEEP: i64 = i64::MIN;

impl Default for StatsRecorder {
    fn default() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expired_reads: AtomicU64::new(0),
            sweeps: AtomicU64::new(0),
            swept_entries: AtomicU64::new(0),
            last_sweep_ms: AtomicI64::new(NO_SWEEP),
        }
    }
}

impl StatsRecorder {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expired_read(&self) {
        self.expired_reads.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Sweep ==
    /// Counts one finished sweep and the entries it removed.
    pub(crate) fn record_sweep(&self, removed: usize) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.swept_entries
            .fetch_add(removed as u64, Ordering::Relaxed);
        self.last_sweep_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    // == Snapshot ==
    pub(crate) fn snapshot(&self, total_entries: usize) -> CacheStats {
        let last_sweep_ms = self.last_sweep_ms.load(Ordering::Relaxed);
        let last_sweep_at = if last_sweep_ms == NO_SWEEP {
            None
        } else {
            Utc.timestamp_millis_opt(last_sweep_ms).single()
        };

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired_reads: self.expired_reads.load(Ordering::Relaxed),
            sweeps: self.sweeps.load(Ordering::Relaxed),
            swept_entries: self.swept_entries.load(Ordering::Relaxed),
            last_sweep_at,
            total_entries,
        }
    }
}
