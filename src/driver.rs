//! The cache driver.
//!
//! This module provides [`CacheDriver`], the type applications talk to. It
//! namespaces keys, encodes values, and runs bulk operations as incremental
//! scans over the backing store.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::codec::{Codec, JsonCodec};
use crate::config::RedisConfig;
use crate::error::CacheResult;
use crate::namespace::Namespace;
use crate::scan;
use crate::stats::{DriverStats, StatsSnapshot};
use crate::store::{KeyValueStore, RedisStore, TTL_PERSISTENT};

/// Keys requested per `SCAN` round unless configured otherwise.
pub const DEFAULT_SCAN_COUNT: usize = 100;

/// A namespaced cache over a remote key-value store.
///
/// Every logical key is stored as `namespace prefix + key`, so drivers with
/// different namespaces never see each other's records. Values go through a
/// [`Codec`] on the way in and out; a record that fails to decode is treated
/// as absent instead of failing the read.
///
/// All operations take `&mut self` and block until the store replies. The
/// driver owns its store handle; the first operation connects.
///
/// # Example
/// ```
/// use scoped_cache_driver::{CacheDriver, MemoryStore, Namespace};
///
/// let mut cache = CacheDriver::new(MemoryStore::new(), Namespace::for_root("/srv/app"));
///
/// cache.set("user:1", "alice", 0)?;
/// cache.set("user:2", "bob", 300)?;
///
/// let name: String = cache.get("user:1", String::new())?;
/// assert_eq!(name, "alice");
///
/// let users = cache.get_all::<String>("user:")?;
/// assert_eq!(users.len(), 2);
///
/// assert_eq!(cache.delete_key_start_with("user:")?, 2);
/// # Ok::<(), scoped_cache_driver::CacheError>(())
/// ```
#[derive(Debug)]
pub struct CacheDriver<S = RedisStore, C = JsonCodec> {
    store: S,
    namespace: Namespace,
    codec: C,
    scan_count: usize,
    stats: Arc<DriverStats>,
}

impl CacheDriver<RedisStore, JsonCodec> {
    /// Build a driver for a Redis server.
    ///
    /// Nothing is dialed until the first operation. `shared == true` places
    /// keys in the shared namespace; otherwise the namespace is derived from
    /// `app_root`.
    pub fn redis(config: RedisConfig, shared: bool, app_root: impl AsRef<Path>) -> Self {
        Self::new(RedisStore::new(config), Namespace::new(shared, app_root))
    }
}

impl<S: KeyValueStore> CacheDriver<S, JsonCodec> {
    /// Create a driver over `store` with the JSON codec.
    pub fn new(store: S, namespace: Namespace) -> Self {
        Self {
            store,
            namespace,
            codec: JsonCodec,
            scan_count: DEFAULT_SCAN_COUNT,
            stats: Arc::new(DriverStats::new()),
        }
    }
}

impl<S: KeyValueStore, C: Codec> CacheDriver<S, C> {
    /// Replace the value codec.
    pub fn with_codec<C2: Codec>(self, codec: C2) -> CacheDriver<S, C2> {
        CacheDriver {
            store: self.store,
            namespace: self.namespace,
            codec,
            scan_count: self.scan_count,
            stats: self.stats,
        }
    }

    /// Set how many keys each `SCAN` round asks for. Values below 1 are
    /// raised to 1.
    pub fn scan_count(mut self, count: usize) -> Self {
        self.scan_count = count.max(1);
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Get a snapshot of the driver statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Get a reference to the internal statistics counter.
    pub fn stats_ref(&self) -> Arc<DriverStats> {
        Arc::clone(&self.stats)
    }

    /// Check that the store is reachable.
    pub fn ping(&mut self) -> CacheResult<()> {
        self.store.ensure_connected()?;
        self.store.ping()
    }

    /// Read `key`, falling back to `default` when it is absent or its record
    /// cannot be decoded.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str, default: T) -> CacheResult<T> {
        Ok(self.fetch(key)?.unwrap_or(default))
    }

    /// Read `key`. `None` when it is absent or its record cannot be decoded.
    ///
    /// Stored values that are "falsy" (`0`, `""`, `false`) come back as
    /// `Some`; only a missing record is `None`.
    pub fn fetch<T: DeserializeOwned>(&mut self, key: &str) -> CacheResult<Option<T>> {
        self.store.ensure_connected()?;
        let storage_key = self.namespace.storage_key(key);

        let value = match self.store.get(&storage_key)? {
            Some(bytes) => self.decode_record(&storage_key, &bytes),
            None => None,
        };
        if value.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
        Ok(value)
    }

    /// Whether a record exists for `key`, decodable or not.
    pub fn contains(&mut self, key: &str) -> CacheResult<bool> {
        self.store.ensure_connected()?;
        let storage_key = self.namespace.storage_key(key);
        Ok(self.store.get(&storage_key)?.is_some())
    }

    /// Store `value` under `key`.
    ///
    /// With `expire_seconds > 0` the record expires after that many seconds;
    /// otherwise it lives until deleted.
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
        expire_seconds: i64,
    ) -> CacheResult<()> {
        self.store.ensure_connected()?;
        let bytes = Bytes::from(self.codec.encode(value)?);
        let ttl = (expire_seconds > 0).then(|| Duration::from_secs(expire_seconds as u64));

        self.store.set(&self.namespace.storage_key(key), bytes, ttl)?;
        self.stats.record_set();
        Ok(())
    }

    /// Remove `key`. Returns `true` if a record was removed; a missing key
    /// is not an error.
    pub fn delete(&mut self, key: &str) -> CacheResult<bool> {
        self.store.ensure_connected()?;
        let removed = self.store.del(&[self.namespace.storage_key(key)])?;
        self.stats.record_deletes(removed);
        Ok(removed > 0)
    }

    /// Remove every key starting with `prefix`. Returns how many records
    /// were removed; no match is a no-op.
    ///
    /// Keys are deleted batch by batch as the scan proceeds. If the call
    /// fails partway, keys already deleted stay deleted.
    pub fn delete_key_start_with(&mut self, prefix: &str) -> CacheResult<u64> {
        self.store.ensure_connected()?;
        self.remove_matching(prefix)
    }

    /// Remove every key in this driver's namespace, and nothing outside it.
    pub fn clear(&mut self) -> CacheResult<u64> {
        self.store.ensure_connected()?;
        self.remove_matching("")
    }

    /// Remaining lifetime of `key` in seconds, or `-1` when it has no
    /// expiry or does not exist.
    pub fn get_ttl(&mut self, key: &str) -> CacheResult<i64> {
        self.store.ensure_connected()?;
        let ttl = self.store.ttl(&self.namespace.storage_key(key))?;
        Ok(if ttl < 0 { TTL_PERSISTENT } else { ttl })
    }

    /// Read every record whose key starts with `prefix`.
    ///
    /// Keys are collected with an incremental scan, then all values are read
    /// with a single `MGET`. Records that fail to decode are left out, as are
    /// keys deleted between the two phases. Result keys are logical keys.
    pub fn get_all<T: DeserializeOwned>(
        &mut self,
        prefix: &str,
    ) -> CacheResult<BTreeMap<String, T>> {
        self.store.ensure_connected()?;
        let keys: Vec<String> = self.scan_keys(prefix)?.into_iter().collect();
        let mut found = BTreeMap::new();
        if keys.is_empty() {
            return Ok(found);
        }

        let values = self.store.mget(&keys)?;
        for (storage_key, bytes) in keys.iter().zip(values) {
            let Some(bytes) = bytes else {
                continue;
            };
            let Some(logical) = self.namespace.logical_key(storage_key) else {
                continue;
            };
            if let Some(value) = self.decode_record(storage_key, &bytes) {
                self.stats.record_hit();
                found.insert(logical.to_string(), value);
            }
        }

        debug!(
            prefix = %prefix,
            matched = keys.len(),
            returned = found.len(),
            "bulk read complete"
        );
        Ok(found)
    }

    /// Logical keys starting with `prefix`, sorted.
    pub fn keys(&mut self, prefix: &str) -> CacheResult<Vec<String>> {
        self.store.ensure_connected()?;
        let keys = self.scan_keys(prefix)?;
        Ok(keys
            .iter()
            .filter_map(|key| self.namespace.logical_key(key))
            .map(str::to_string)
            .collect())
    }

    fn scan_keys(&mut self, prefix: &str) -> CacheResult<BTreeSet<String>> {
        let pattern = self.namespace.scan_pattern(prefix);
        let (keys, summary) = scan::collect_keys(&mut self.store, &pattern, self.scan_count)?;
        self.stats.record_scan(summary.rounds, summary.keys_seen);
        Ok(keys)
    }

    fn remove_matching(&mut self, prefix: &str) -> CacheResult<u64> {
        let pattern = self.namespace.scan_pattern(prefix);
        let (removed, summary) =
            scan::delete_matching(&mut self.store, &pattern, self.scan_count)?;
        self.stats.record_scan(summary.rounds, summary.keys_seen);
        self.stats.record_deletes(removed);

        debug!(
            pattern = %pattern,
            removed,
            rounds = summary.rounds,
            "bulk delete complete"
        );
        Ok(removed)
    }

    fn decode_record<T: DeserializeOwned>(&self, storage_key: &str, bytes: &[u8]) -> Option<T> {
        match self.codec.decode(bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                self.stats.record_corrupt();
                warn!(key = %storage_key, error = %err, "skipping undecodable record");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MessagePackCodec;
    use crate::store::MemoryStore;
    use serde::Deserialize;

    fn driver() -> CacheDriver<MemoryStore> {
        CacheDriver::new(MemoryStore::new(), Namespace::with_prefix("t:"))
    }

    #[test]
    fn test_get_default_when_missing() {
        let mut cache = driver();
        assert_eq!(cache.get("nope", 42i32).unwrap(), 42);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_set_writes_prefixed_key() {
        let mut cache = driver();
        cache.set("k", &"v", 0).unwrap();

        let raw = cache.store_mut().get("t:k").unwrap();
        assert_eq!(raw, Some(Bytes::from_static(b"\"v\"")));
        assert!(cache.store_mut().get("k").unwrap().is_none());
    }

    #[test]
    fn test_falsy_values_are_not_absent() {
        let mut cache = driver();
        cache.set("zero", &0u8, 0).unwrap();
        cache.set("empty", "", 0).unwrap();
        cache.set("no", &false, 0).unwrap();

        assert_eq!(cache.fetch::<u8>("zero").unwrap(), Some(0));
        assert_eq!(cache.fetch::<String>("empty").unwrap(), Some(String::new()));
        assert_eq!(cache.fetch::<bool>("no").unwrap(), Some(false));
    }

    #[test]
    fn test_corrupt_single_record_returns_default() {
        let mut cache = driver();
        cache
            .store_mut()
            .set("t:bad", Bytes::from_static(b"{not json"), None)
            .unwrap();

        assert_eq!(cache.get("bad", 7i32).unwrap(), 7);
        assert!(cache.contains("bad").unwrap());
        assert_eq!(cache.stats().corrupt_records, 1);
    }

    #[test]
    fn test_delete_reports_removal() {
        let mut cache = driver();
        cache.set("k", &1, 0).unwrap();

        assert!(cache.delete("k").unwrap());
        assert!(!cache.delete("k").unwrap());
        assert_eq!(cache.stats().deletes, 1);
    }

    #[test]
    fn test_non_positive_expiry_persists() {
        let mut cache = driver();
        cache.set("a", &1, 0).unwrap();
        cache.set("b", &1, -5).unwrap();

        assert_eq!(cache.get_ttl("a").unwrap(), -1);
        assert_eq!(cache.get_ttl("b").unwrap(), -1);
        assert_eq!(cache.get_ttl("missing").unwrap(), -1);
    }

    #[test]
    fn test_scan_count_floor() {
        let cache = driver().scan_count(0);
        assert_eq!(cache.scan_count, 1);
    }

    #[test]
    fn test_with_codec_keeps_namespace_and_stats() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Point {
            x: i32,
            y: i32,
        }

        let mut cache = driver().with_codec(MessagePackCodec);
        cache.set("p", &Point { x: 1, y: -2 }, 0).unwrap();

        assert_eq!(cache.namespace().prefix(), "t:");
        assert_eq!(cache.fetch::<Point>("p").unwrap(), Some(Point { x: 1, y: -2 }));
        assert_eq!(cache.stats().sets, 1);
    }

    #[test]
    fn test_keys_are_logical_and_sorted() {
        let mut cache = driver();
        cache.set("b2", &1, 0).unwrap();
        cache.set("b1", &1, 0).unwrap();
        cache.set("a1", &1, 0).unwrap();

        assert_eq!(cache.keys("b").unwrap(), vec!["b1", "b2"]);
        assert_eq!(cache.keys("").unwrap().len(), 3);
    }

    #[test]
    fn test_ping_memory_store() {
        let mut cache = driver();
        assert!(cache.ping().is_ok());
    }
}
