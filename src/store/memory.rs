//! In-process store implementing the backing store protocol.
//!
//! `MemoryStore` behaves like a single Redis database: lazy expiry, `TTL`
//! replies with Redis semantics, and a cursor-based `SCAN`. Clones share one
//! underlying map, so several drivers can sit on the same store, exactly as
//! they would on one server.
//!
//! Keys live in a `BTreeMap`. The scan cursor is the last key examined, so a
//! walk stays correct while keys are deleted between rounds.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use super::entry::Entry;
use super::{KeyValueStore, TTL_MISSING, TTL_PERSISTENT};
use crate::error::{CacheError, CacheResult};
use crate::pattern::Glob;
use crate::scan::ScanCursor;

type Map = BTreeMap<String, Entry>;

/// Thread-safe in-memory key-value store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<Map>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        match self.read_lock() {
            Ok(entries) => entries.values().filter(|e| !e.is_expired_at(now)).count(),
            Err(_) => 0,
        }
    }

    /// Check if the store holds no live records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all expired records. Returns how many were dropped.
    pub fn purge_expired(&self) -> CacheResult<usize> {
        let mut entries = self.write_lock()?;
        let initial_len = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        Ok(initial_len - entries.len())
    }

    // Private helper methods

    fn read_lock(&self) -> CacheResult<RwLockReadGuard<'_, Map>> {
        self.entries
            .read()
            .map_err(|e| CacheError::LockError(e.to_string()))
    }

    fn write_lock(&self) -> CacheResult<RwLockWriteGuard<'_, Map>> {
        self.entries
            .write()
            .map_err(|e| CacheError::LockError(e.to_string()))
    }

    /// Remove `key` if it is still expired.
    fn remove_expired(&self, key: &str) -> CacheResult<()> {
        let mut entries = self.write_lock()?;
        if entries
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(Instant::now()))
        {
            entries.remove(key);
        }
        Ok(())
    }

    fn live_value(&self, key: &str) -> CacheResult<Option<Bytes>> {
        let entries = self.read_lock()?;
        match entries.get(key) {
            Some(entry) if !entry.is_expired_at(Instant::now()) => {
                return Ok(Some(entry.value().clone()));
            }
            Some(_) => {}
            None => return Ok(None),
        }

        // Expired: need the write lock to drop it.
        drop(entries);
        self.remove_expired(key)?;
        Ok(None)
    }
}

impl KeyValueStore for MemoryStore {
    fn ensure_connected(&mut self) -> CacheResult<()> {
        Ok(())
    }

    fn ping(&mut self) -> CacheResult<()> {
        self.read_lock().map(|_| ())
    }

    fn get(&mut self, key: &str) -> CacheResult<Option<Bytes>> {
        self.live_value(key)
    }

    fn set(&mut self, key: &str, value: Bytes, ttl: Option<Duration>) -> CacheResult<()> {
        let entry = match ttl {
            Some(ttl) => Entry::expiring(value, Instant::now(), ttl),
            None => Entry::new(value),
        };
        self.write_lock()?.insert(key.to_string(), entry);
        Ok(())
    }

    fn del(&mut self, keys: &[String]) -> CacheResult<u64> {
        let mut entries = self.write_lock()?;
        let now = Instant::now();
        let mut removed = 0;
        for key in keys {
            if let Some(entry) = entries.remove(key) {
                if !entry.is_expired_at(now) {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    fn ttl(&mut self, key: &str) -> CacheResult<i64> {
        let entries = self.read_lock()?;
        let now = Instant::now();
        let reply = match entries.get(key) {
            None => TTL_MISSING,
            Some(entry) if entry.is_expired_at(now) => TTL_MISSING,
            Some(entry) => match entry.remaining_at(now) {
                // Redis rounds the millisecond TTL to the nearest second.
                Some(left) => ((left.as_millis() + 500) / 1000) as i64,
                None => TTL_PERSISTENT,
            },
        };
        Ok(reply)
    }

    fn scan(
        &mut self,
        cursor: &ScanCursor,
        pattern: &str,
        count: usize,
    ) -> CacheResult<(ScanCursor, Vec<String>)> {
        let lower = match cursor {
            ScanCursor::Done => return Ok((ScanCursor::Done, Vec::new())),
            ScanCursor::Start => Bound::Unbounded,
            ScanCursor::At(last) => Bound::Excluded(last.clone()),
        };
        let glob = Glob::new(pattern)?;
        let entries = self.read_lock()?;
        let now = Instant::now();

        let mut range = entries
            .range::<String, _>((lower, Bound::Unbounded))
            .peekable();
        let mut batch = Vec::new();
        let mut last = None;
        for _ in 0..count.max(1) {
            let Some((key, entry)) = range.next() else {
                break;
            };
            if !entry.is_expired_at(now) && glob.matches(key) {
                batch.push(key.clone());
            }
            last = Some(key);
        }

        let next = match (last, range.peek()) {
            (Some(last), Some(_)) => ScanCursor::At(last.clone()),
            _ => ScanCursor::Done,
        };
        Ok((next, batch))
    }

    fn mget(&mut self, keys: &[String]) -> CacheResult<Vec<Option<Bytes>>> {
        let entries = self.read_lock()?;
        let now = Instant::now();
        Ok(keys
            .iter()
            .map(|key| {
                entries
                    .get(key)
                    .filter(|entry| !entry.is_expired_at(now))
                    .map(|entry| entry.value().clone())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_basic_set_get() {
        let mut store = MemoryStore::new();

        store.set("key1", Bytes::from("value1"), None).unwrap();
        assert_eq!(store.get("key1").unwrap(), Some(Bytes::from("value1")));
    }

    #[test]
    fn test_get_nonexistent() {
        let mut store = MemoryStore::new();
        assert!(store.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_overwrite() {
        let mut store = MemoryStore::new();

        store.set("key1", Bytes::from("value1"), None).unwrap();
        store.set("key1", Bytes::from("value2"), None).unwrap();

        assert_eq!(store.get("key1").unwrap(), Some(Bytes::from("value2")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_del_counts_only_existing() {
        let mut store = MemoryStore::new();
        store.set("a", Bytes::from("1"), None).unwrap();
        store.set("b", Bytes::from("2"), None).unwrap();

        assert_eq!(store.del(&keys(&["a", "b", "missing"])).unwrap(), 2);
        assert_eq!(store.del(&keys(&["a"])).unwrap(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_ttl_replies() {
        let mut store = MemoryStore::new();
        store.set("forever", Bytes::from("v"), None).unwrap();
        store
            .set("short", Bytes::from("v"), Some(Duration::from_secs(30)))
            .unwrap();

        assert_eq!(store.ttl("forever").unwrap(), TTL_PERSISTENT);
        assert_eq!(store.ttl("missing").unwrap(), TTL_MISSING);
        let left = store.ttl("short").unwrap();
        assert!(left > 0 && left <= 30, "ttl was {}", left);
    }

    #[test]
    fn test_ttl_expiration() {
        let mut store = MemoryStore::new();
        store
            .set("key1", Bytes::from("value1"), Some(Duration::from_millis(1)))
            .unwrap();

        std::thread::sleep(Duration::from_millis(10));

        assert!(store.get("key1").unwrap().is_none());
        assert_eq!(store.ttl("key1").unwrap(), TTL_MISSING);
    }

    #[test]
    fn test_purge_expired() {
        let mut store = MemoryStore::new();
        store
            .set("gone", Bytes::from("v"), Some(Duration::from_millis(1)))
            .unwrap();
        store.set("kept", Bytes::from("v"), None).unwrap();

        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(store.purge_expired().unwrap(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clones_share_data() {
        let mut a = MemoryStore::new();
        let mut b = a.clone();

        a.set("k", Bytes::from("v"), None).unwrap();
        assert_eq!(b.get("k").unwrap(), Some(Bytes::from("v")));
    }

    #[test]
    fn test_mget_preserves_order_and_gaps() {
        let mut store = MemoryStore::new();
        store.set("a", Bytes::from("1"), None).unwrap();
        store.set("c", Bytes::from("3"), None).unwrap();

        let values = store.mget(&keys(&["c", "b", "a"])).unwrap();
        assert_eq!(
            values,
            vec![Some(Bytes::from("3")), None, Some(Bytes::from("1"))]
        );
    }

    #[test]
    fn test_scan_walks_in_bounded_batches() {
        let mut store = MemoryStore::new();
        for i in 0..10 {
            store
                .set(&format!("k{}", i), Bytes::from("v"), None)
                .unwrap();
        }

        let mut cursor = ScanCursor::Start;
        let mut seen = Vec::new();
        let mut rounds = 0;
        while !cursor.is_done() {
            let (next, batch) = store.scan(&cursor, "k*", 3).unwrap();
            assert!(batch.len() <= 3);
            seen.extend(batch);
            cursor = next;
            rounds += 1;
        }

        assert_eq!(rounds, 4);
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn test_scan_survives_deletes_between_rounds() {
        let mut store = MemoryStore::new();
        for i in 0..20 {
            store
                .set(&format!("k{:02}", i), Bytes::from("v"), None)
                .unwrap();
        }

        let mut cursor = ScanCursor::Start;
        let mut deleted = 0;
        while !cursor.is_done() {
            let (next, batch) = store.scan(&cursor, "*", 4).unwrap();
            deleted += store.del(&batch).unwrap();
            cursor = next;
        }

        assert_eq!(deleted, 20);
        assert!(store.is_empty());
    }

    #[test]
    fn test_scan_filters_by_pattern() {
        let mut store = MemoryStore::new();
        store.set("a:1", Bytes::from("v"), None).unwrap();
        store.set("b:1", Bytes::from("v"), None).unwrap();

        let (next, batch) = store.scan(&ScanCursor::Start, "a:*", 100).unwrap();
        assert!(next.is_done());
        assert_eq!(batch, vec!["a:1".to_string()]);
    }
}
