//! Backing store protocol.
//!
//! [`KeyValueStore`] is the request/response surface the driver consumes:
//! the handful of native commands a Redis-compatible server offers. Keys at
//! this level are storage keys; namespacing happens above, in the driver.

use bytes::Bytes;
use std::time::Duration;

use crate::error::CacheResult;
use crate::scan::ScanCursor;

pub(crate) mod entry;
pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// `TTL` reply for a key that does not exist.
pub const TTL_MISSING: i64 = -2;

/// `TTL` reply for a key that exists without an expiry.
pub const TTL_PERSISTENT: i64 = -1;

/// Native commands of a remote key-value store.
///
/// Every method takes `&mut self`: a store handle carries one command at a
/// time. Implementations connect lazily, so every command may first have to
/// dial the server.
pub trait KeyValueStore {
    /// Make sure a live, authenticated connection exists.
    ///
    /// Idempotent. Reuses an existing connection instead of dialing again.
    fn ensure_connected(&mut self) -> CacheResult<()>;

    /// Round-trip health check (`PING`).
    fn ping(&mut self) -> CacheResult<()>;

    /// `GET key`. `None` when the key is absent.
    fn get(&mut self, key: &str) -> CacheResult<Option<Bytes>>;

    /// `SET key value [EX seconds]`. `None` keeps the record until deleted.
    fn set(&mut self, key: &str, value: Bytes, ttl: Option<Duration>) -> CacheResult<()>;

    /// `DEL key [key ...]`. Returns how many records were removed.
    fn del(&mut self, keys: &[String]) -> CacheResult<u64>;

    /// `TTL key` with Redis semantics: remaining seconds, [`TTL_PERSISTENT`]
    /// or [`TTL_MISSING`].
    fn ttl(&mut self, key: &str) -> CacheResult<i64>;

    /// `SCAN cursor MATCH pattern COUNT count`.
    ///
    /// Returns the next cursor and a batch of matching keys. The batch may be
    /// empty before the walk ends, and a key may appear in more than one batch.
    fn scan(
        &mut self,
        cursor: &ScanCursor,
        pattern: &str,
        count: usize,
    ) -> CacheResult<(ScanCursor, Vec<String>)>;

    /// `MGET key [key ...]` in one round trip. The result has one slot per
    /// requested key, in order; `None` marks a missing key.
    fn mget(&mut self, keys: &[String]) -> CacheResult<Vec<Option<Bytes>>>;
}
