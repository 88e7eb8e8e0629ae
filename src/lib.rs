//! # Scoped Cache Driver
//!
//! A cache driver that gives applications a small get/set/delete/clear
//! contract over a Redis server, with three guarantees on top of the raw
//! protocol:
//!
//! - **Namespacing**: every key is stored under a prefix derived from the
//!   application root (or a fixed shared prefix), so several applications
//!   can share one server without collisions.
//! - **Incremental bulk operations**: prefix delete, clear and prefix read
//!   walk the key space with `SCAN`, never with a blocking `KEYS`.
//! - **Corruption isolation**: a record that fails to decode is treated as
//!   absent; it never fails a read, and never fails a bulk read of other keys.
//!
//! ## Quick Start
//!
//! ```no_run
//! use scoped_cache_driver::{CacheDriver, RedisConfig};
//!
//! let config = RedisConfig::new()
//!     .host("127.0.0.1")
//!     .port(6379)
//!     .timeout(2)
//!     .build();
//!
//! // Connects on first use.
//! let mut cache = CacheDriver::redis(config, false, "/srv/my-app");
//!
//! cache.set("session:abc", &vec![1, 2, 3], 3600)?;
//! let session: Vec<u8> = cache.get("session:abc", Vec::new())?;
//!
//! let sessions = cache.get_all::<Vec<u8>>("session:")?;
//! cache.delete_key_start_with("session:")?;
//! # Ok::<(), scoped_cache_driver::CacheError>(())
//! ```
//!
//! ## Testing without a server
//!
//! [`MemoryStore`] implements the same store protocol in process, including
//! expiry and cursor scans:
//!
//! ```rust
//! use scoped_cache_driver::{CacheDriver, MemoryStore, Namespace};
//!
//! let store = MemoryStore::new();
//! let mut a = CacheDriver::new(store.clone(), Namespace::for_root("/apps/a"));
//! let mut b = CacheDriver::new(store, Namespace::for_root("/apps/b"));
//!
//! a.set("foo", "from a", 0)?;
//! assert_eq!(b.get("foo", String::from("unset"))?, "unset");
//! # Ok::<(), scoped_cache_driver::CacheError>(())
//! ```

pub mod codec;
pub mod config;
pub mod driver;
pub mod error;
pub mod namespace;
pub mod pattern;
pub mod scan;
pub mod stats;
pub mod store;

pub use codec::{Codec, JsonCodec, MessagePackCodec};
pub use config::RedisConfig;
pub use driver::{CacheDriver, DEFAULT_SCAN_COUNT};
pub use error::{CacheError, CacheResult};
pub use namespace::{Namespace, SHARED_PREFIX};
pub use scan::ScanCursor;
pub use stats::{DriverStats, StatsSnapshot};
pub use store::{KeyValueStore, MemoryStore, RedisStore};

pub mod cli;
pub use cli::{Cli, ClientCommand};
