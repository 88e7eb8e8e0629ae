//! Value serialization.
//!
//! A codec turns an application value into the bytes stored in the cache
//! and back. The byte format is private to the codec; the driver only
//! relies on `decode(encode(v)) == v` and on `decode` failing, not
//! panicking, for bytes it did not produce.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, CacheResult};

/// Reversible value encoding used by the driver.
pub trait Codec {
    /// Serialize `value` into storable bytes.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> CacheResult<Vec<u8>>;

    /// Deserialize bytes produced by [`Codec::encode`].
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> CacheResult<T>;
}

/// JSON encoding via `serde_json`. The default codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> CacheResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CacheError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> CacheResult<T> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::Decode(e.to_string()))
    }
}

/// Compact binary encoding via MessagePack (`rmp-serde`).
///
/// Structs are written as maps so that adding fields stays compatible.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePackCodec;

impl Codec for MessagePackCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> CacheResult<Vec<u8>> {
        rmp_serde::to_vec_named(value).map_err(|e| CacheError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> CacheResult<T> {
        rmp_serde::from_slice(bytes).map_err(|e| CacheError::Decode(e.to_string()))
    }
}
