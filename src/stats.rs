//! Statistics for driver operations.
//!
//! Atomic counters track what the driver asked of the store and what it got
//! back, without locking on the hot path.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one driver.
///
/// Use `CacheDriver::stats()` to get a snapshot.
#[derive(Debug, Default)]
pub struct DriverStats {
    /// Reads that found a decodable record.
    hits: AtomicU64,

    /// Reads that found nothing.
    misses: AtomicU64,

    /// Records written.
    sets: AtomicU64,

    /// Records removed, by single or bulk delete.
    deletes: AtomicU64,

    /// `SCAN` round trips issued by bulk operations.
    scan_rounds: AtomicU64,

    /// Keys reported by `SCAN`, duplicates included.
    keys_scanned: AtomicU64,

    /// Records skipped because they failed to decode.
    corrupt_records: AtomicU64,
}

impl DriverStats {
    /// Create a new stats instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `n` removed records.
    pub fn record_deletes(&self, n: u64) {
        self.deletes.fetch_add(n, Ordering::Relaxed);
    }

    /// Record a completed walk.
    pub fn record_scan(&self, rounds: u64, keys_seen: u64) {
        self.scan_rounds.fetch_add(rounds, Ordering::Relaxed);
        self.keys_scanned.fetch_add(keys_seen, Ordering::Relaxed);
    }

    pub fn record_corrupt(&self) {
        self.corrupt_records.fetch_add(1, Ordering::Relaxed);
    }

    // Getters for reading statistics

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn sets(&self) -> u64 {
        self.sets.load(Ordering::Relaxed)
    }

    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    pub fn scan_rounds(&self) -> u64 {
        self.scan_rounds.load(Ordering::Relaxed)
    }

    pub fn keys_scanned(&self) -> u64 {
        self.keys_scanned.load(Ordering::Relaxed)
    }

    pub fn corrupt_records(&self) -> u64 {
        self.corrupt_records.load(Ordering::Relaxed)
    }

    /// Calculate the hit rate as a percentage (0.0 to 100.0).
    /// Returns 0.0 if no reads have been performed.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            sets: self.sets(),
            deletes: self.deletes(),
            scan_rounds: self.scan_rounds(),
            keys_scanned: self.keys_scanned(),
            corrupt_records: self.corrupt_records(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// A point-in-time snapshot of driver statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub scan_rounds: u64,
    pub keys_scanned: u64,
    pub corrupt_records: u64,
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_stats() {
        let stats = DriverStats::new();
        assert_eq!(stats.hits(), 0);
        assert_eq!(stats.misses(), 0);
        assert_eq!(stats.scan_rounds(), 0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = DriverStats::new();
        assert_eq!(stats.hit_rate(), 0.0);

        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();

        assert!((stats.hit_rate() - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_bulk_counters() {
        let stats = DriverStats::new();
        stats.record_scan(4, 120);
        stats.record_scan(1, 3);
        stats.record_deletes(100);
        stats.record_corrupt();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.scan_rounds, 5);
        assert_eq!(snapshot.keys_scanned, 123);
        assert_eq!(snapshot.deletes, 100);
        assert_eq!(snapshot.corrupt_records, 1);
    }
}
