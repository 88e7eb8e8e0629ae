//! Redis-backed store and connection manager.

use bytes::Bytes;
use redis::{Client, Cmd, Connection, FromRedisValue, RedisError};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::KeyValueStore;
use crate::config::RedisConfig;
use crate::error::{CacheError, CacheResult};
use crate::scan::ScanCursor;

/// Terminal cursor value of `SCAN`.
const SCAN_TERMINAL: &str = "0";

/// A lazily connected Redis store.
///
/// No connection is opened by [`RedisStore::new`]. The first command dials
/// the server (and authenticates when a password is configured); later
/// commands reuse that connection. If a command fails because the
/// connection dropped, the connection is discarded and the next command
/// dials again. Nothing is retried inside the failing call.
pub struct RedisStore {
    config: RedisConfig,
    connection: Option<Connection>,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("addr", &self.config.addr())
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

impl RedisStore {
    /// Create a store for `config` without connecting.
    pub fn new(config: RedisConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    /// Whether a connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Open and authenticate a new connection.
    fn dial(&self) -> CacheResult<Connection> {
        let addr = self.config.addr();
        let connect_err = |source: RedisError| CacheError::Connection {
            addr: addr.clone(),
            source,
        };

        let client = Client::open(self.config.connection_url().as_str()).map_err(connect_err)?;
        let mut connection = match self.config.connect_timeout() {
            Some(timeout) => client.get_connection_with_timeout(timeout),
            None => client.get_connection(),
        }
        .map_err(connect_err)?;

        if let Some(password) = self.config.get_password() {
            redis::cmd("AUTH")
                .arg(password)
                .query::<()>(&mut connection)
                .map_err(|e| CacheError::Auth(e.to_string()))?;
            debug!(addr = %addr, "authenticated");
        }

        info!(addr = %addr, "connected to redis");
        Ok(connection)
    }

    /// The live connection, dialing first if none is held.
    fn connection(&mut self) -> CacheResult<&mut Connection> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.dial()?,
        };
        Ok(self.connection.insert(connection))
    }

    fn query<T: FromRedisValue>(&mut self, cmd: &Cmd) -> CacheResult<T> {
        let connection = self.connection()?;
        cmd.query(connection).map_err(|err| {
            if err.is_connection_dropped() || err.is_io_error() || err.is_timeout() {
                warn!(addr = %self.config.addr(), error = %err, "dropping broken connection");
                self.connection = None;
            }
            CacheError::Command(err)
        })
    }
}

impl KeyValueStore for RedisStore {
    fn ensure_connected(&mut self) -> CacheResult<()> {
        self.connection().map(|_| ())
    }

    fn ping(&mut self) -> CacheResult<()> {
        self.query::<String>(&redis::cmd("PING")).map(|_| ())
    }

    fn get(&mut self, key: &str) -> CacheResult<Option<Bytes>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        let value: Option<Vec<u8>> = self.query(&cmd)?;
        Ok(value.map(Bytes::from))
    }

    fn set(&mut self, key: &str, value: Bytes, ttl: Option<Duration>) -> CacheResult<()> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(&value[..]);
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        self.query::<()>(&cmd)
    }

    fn del(&mut self, keys: &[String]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut cmd = redis::cmd("DEL");
        cmd.arg(keys);
        self.query(&cmd)
    }

    fn ttl(&mut self, key: &str) -> CacheResult<i64> {
        let mut cmd = redis::cmd("TTL");
        cmd.arg(key);
        self.query(&cmd)
    }

    fn scan(
        &mut self,
        cursor: &ScanCursor,
        pattern: &str,
        count: usize,
    ) -> CacheResult<(ScanCursor, Vec<String>)> {
        let position = match cursor {
            ScanCursor::Done => return Ok((ScanCursor::Done, Vec::new())),
            ScanCursor::Start => SCAN_TERMINAL,
            ScanCursor::At(position) => position.as_str(),
        };

        let mut cmd = redis::cmd("SCAN");
        cmd.arg(position)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count.max(1));
        let (next, keys): (String, Vec<String>) = self.query(&cmd)?;

        let next = if next == SCAN_TERMINAL {
            ScanCursor::Done
        } else {
            ScanCursor::At(next)
        };
        Ok((next, keys))
    }

    fn mget(&mut self, keys: &[String]) -> CacheResult<Vec<Option<Bytes>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut cmd = redis::cmd("MGET");
        cmd.arg(keys);
        let values: Vec<Option<Vec<u8>>> = self.query(&cmd)?;
        Ok(values.into_iter().map(|v| v.map(Bytes::from)).collect())
    }
}
