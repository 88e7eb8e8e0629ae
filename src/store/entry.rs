//! Stored record with expiry metadata for the in-process store.

use bytes::Bytes;
use std::time::{Duration, Instant};

/// A single record held by [`MemoryStore`](super::MemoryStore).
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored bytes.
    pub(crate) value: Bytes,

    /// When this record expires. `None` means it lives until deleted.
    pub(crate) expires_at: Option<Instant>,
}

impl Entry {
    /// Create a record with no expiration.
    pub fn new(value: Bytes) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Create a record that expires `ttl` after `now`.
    pub fn expiring(value: Bytes, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Some(now + ttl),
        }
    }

    /// Check if this record has expired at a given time.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Time left before expiry, `None` for records without one.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(now))
    }

    /// Get a reference to the value.
    pub fn value(&self) -> &Bytes {
        &self.value
    }
}
