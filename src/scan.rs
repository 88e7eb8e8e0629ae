//! Incremental key-space scanning.
//!
//! Bulk operations never ask the store for every key at once. They walk the
//! key space with `SCAN`, one bounded batch per round trip, passing the
//! store's cursor back unchanged until the store reports the walk finished.

use std::collections::BTreeSet;

use crate::error::CacheResult;
use crate::store::KeyValueStore;

/// Continuation token for an incremental scan.
///
/// The token is opaque: stores may encode it however they like, and the
/// scanner only checks whether it is [`ScanCursor::Done`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanCursor {
    /// Beginning of a walk.
    #[default]
    Start,
    /// Resume position issued by the store.
    At(String),
    /// The walk is complete.
    Done,
}

impl ScanCursor {
    /// Whether the walk has finished.
    pub fn is_done(&self) -> bool {
        matches!(self, ScanCursor::Done)
    }
}

/// State of one scan over keys matching a glob pattern.
///
/// `Scan` holds no borrow of the store, so batches can be processed with the
/// same store handle between rounds (for example to delete them).
#[derive(Debug, Clone)]
pub struct Scan {
    pattern: String,
    count: usize,
    cursor: ScanCursor,
    rounds: u64,
}

impl Scan {
    /// Start a scan for `pattern`, asking for roughly `count` keys per round.
    pub fn new(pattern: impl Into<String>, count: usize) -> Self {
        Self {
            pattern: pattern.into(),
            count: count.max(1),
            cursor: ScanCursor::Start,
            rounds: 0,
        }
    }

    /// Fetch the next batch, or `None` once the store has reported the end.
    ///
    /// A batch may be empty while the walk is still in progress.
    pub fn next_batch<S>(&mut self, store: &mut S) -> CacheResult<Option<Vec<String>>>
    where
        S: KeyValueStore + ?Sized,
    {
        if self.cursor.is_done() {
            return Ok(None);
        }
        let (next, keys) = store.scan(&self.cursor, &self.pattern, self.count)?;
        self.cursor = next;
        self.rounds += 1;
        Ok(Some(keys))
    }

    /// Number of round trips issued so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_done(&self) -> bool {
        self.cursor.is_done()
    }
}

/// Outcome of a completed walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Round trips issued.
    pub rounds: u64,
    /// Keys reported by the store, duplicates included.
    pub keys_seen: u64,
}

/// Collect every distinct key matching `pattern`.
///
/// The store may report a key more than once during a walk; the result
/// holds each key exactly once, sorted.
pub fn collect_keys<S>(
    store: &mut S,
    pattern: &str,
    count: usize,
) -> CacheResult<(BTreeSet<String>, ScanSummary)>
where
    S: KeyValueStore + ?Sized,
{
    let mut scan = Scan::new(pattern, count);
    let mut keys = BTreeSet::new();
    let mut summary = ScanSummary::default();

    while let Some(batch) = scan.next_batch(store)? {
        summary.keys_seen += batch.len() as u64;
        keys.extend(batch);
    }

    summary.rounds = scan.rounds();
    Ok((keys, summary))
}

/// Delete every key matching `pattern`, batch by batch, as the walk goes.
///
/// Returns the number of records the store actually removed. Not atomic: if
/// a round trip fails, batches already deleted stay deleted.
pub fn delete_matching<S>(
    store: &mut S,
    pattern: &str,
    count: usize,
) -> CacheResult<(u64, ScanSummary)>
where
    S: KeyValueStore + ?Sized,
{
    let mut scan = Scan::new(pattern, count);
    let mut removed = 0;
    let mut summary = ScanSummary::default();

    while let Some(batch) = scan.next_batch(store)? {
        summary.keys_seen += batch.len() as u64;
        if !batch.is_empty() {
            removed += store.del(&batch)?;
        }
    }

    summary.rounds = scan.rounds();
    Ok((removed, summary))
}
