//! Error types for the cache driver.
//!
//! Absent keys are never errors: `get` falls back to a default, `delete`
//! reports `false` and `get_ttl` reports `-1`. Everything below is a real
//! failure of the connection, a store command, or a value conversion.

use thiserror::Error;

/// The main error type for cache driver operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The transport connection to the backing store could not be opened.
    #[error("connect to {addr} failed: {source}")]
    Connection {
        addr: String,
        #[source]
        source: redis::RedisError,
    },

    /// The backing store rejected the configured password.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A store command failed for a reason other than "key absent".
    #[error("store command failed: {0}")]
    Command(#[from] redis::RedisError),

    /// A value could not be serialized for storage.
    #[error("encode error: {0}")]
    Encode(String),

    /// Stored bytes could not be deserialized.
    ///
    /// Read paths of the driver swallow this per record; it only surfaces
    /// when a codec is used directly.
    #[error("decode error: {0}")]
    Decode(String),

    /// The configuration mapping was malformed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The in-process store's lock was poisoned.
    #[error("lock error: {0}")]
    LockError(String),
}

impl CacheError {
    /// Whether this error came from connecting or authenticating.
    ///
    /// Connection errors abort the current call and are never retried
    /// internally; the next call dials again.
    pub fn is_connection(&self) -> bool {
        matches!(self, CacheError::Connection { .. } | CacheError::Auth(_))
    }
}

/// A specialized Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
