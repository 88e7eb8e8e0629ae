//! Key namespacing.
//!
//! Every key a driver sends to the store is `prefix + logical_key`. The
//! prefix is resolved once, when the driver is built: either the fixed
//! [`SHARED_PREFIX`] or a digest of the application root, so drivers for
//! different applications never collide in one backing store.

use std::path::Path;

use crate::pattern;

/// Prefix used by caches that are explicitly shared between applications.
pub const SHARED_PREFIX: &str = "shared:";

/// A resolved key namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
}

impl Namespace {
    /// Resolve the namespace for a driver.
    ///
    /// `shared == true` selects [`SHARED_PREFIX`] and ignores `app_root`.
    pub fn new(shared: bool, app_root: impl AsRef<Path>) -> Self {
        if shared {
            Self::shared()
        } else {
            Self::for_root(app_root)
        }
    }

    /// The namespace shared by every driver built with `shared == true`.
    pub fn shared() -> Self {
        Self {
            prefix: SHARED_PREFIX.to_string(),
        }
    }

    /// A private namespace derived from an application root path.
    ///
    /// The prefix is the lowercase hex MD5 digest of the path followed by `:`.
    pub fn for_root(app_root: impl AsRef<Path>) -> Self {
        let root = app_root.as_ref().to_string_lossy();
        let digest = md5::compute(root.as_bytes());
        Self {
            prefix: format!("{:x}:", digest),
        }
    }

    /// A namespace with an explicit prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn storage_key(&self, logical_key: &str) -> String {
        let mut key = String::with_capacity(self.prefix.len() + logical_key.len());
        key.push_str(&self.prefix);
        key.push_str(logical_key);
        key
    }

    /// Strip the prefix from a storage key, or `None` for a foreign key.
    pub fn logical_key<'a>(&self, storage_key: &'a str) -> Option<&'a str> {
        storage_key.strip_prefix(self.prefix.as_str())
    }

    /// `SCAN MATCH` pattern for every key in this namespace starting with
    /// `logical_prefix`. An empty prefix covers the whole namespace.
    pub fn scan_pattern(&self, logical_prefix: &str) -> String {
        pattern::prefix_pattern(&self.storage_key(logical_prefix))
    }
}
