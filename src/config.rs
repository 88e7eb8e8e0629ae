//! Connection configuration for the backing Redis server.
//!
//! The configuration is supplied once when a driver is built and never
//! changes afterwards. It can be assembled with the builder methods,
//! deserialized with serde, or read from a plain string mapping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{CacheError, CacheResult};

/// Default Redis port.
pub const DEFAULT_PORT: u16 = 6379;

/// Connection settings for a Redis server.
///
/// ```
/// use scoped_cache_driver::RedisConfig;
///
/// let config = RedisConfig::new()
///     .host("cache.internal")
///     .port(6380)
///     .password("s3cret")
///     .timeout(2)
///     .build();
///
/// assert_eq!(config.addr(), "cache.internal:6380");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Server host name or address.
    #[serde(default = "default_host")]
    pub(crate) host: String,

    /// Server TCP port.
    #[serde(default = "default_port")]
    pub(crate) port: u16,

    /// Shared secret sent with `AUTH`. `None` skips authentication.
    #[serde(default)]
    pub(crate) password: Option<String>,

    /// Connect timeout in seconds. `0` means no timeout.
    #[serde(default)]
    pub(crate) timeout: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            password: None,
            timeout: 0,
        }
    }
}

impl RedisConfig {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the server port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the password. An empty string disables authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        let password = password.into();
        self.password = if password.is_empty() {
            None
        } else {
            Some(password)
        };
        self
    }

    /// Set the connect timeout in seconds. `0` disables the timeout.
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> Self {
        self
    }

    /// Read a configuration from a string mapping.
    ///
    /// Recognized keys are `host`, `port`, `password` and `timeout`; missing
    /// keys keep their defaults and unknown keys are ignored.
    pub fn from_map(map: &HashMap<String, String>) -> CacheResult<Self> {
        let mut config = Self::default();

        if let Some(host) = map.get("host") {
            if host.trim().is_empty() {
                return Err(CacheError::Config("host: must not be empty".to_string()));
            }
            config.host = host.trim().to_string();
        }
        if let Some(port) = map.get("port") {
            config.port = port
                .trim()
                .parse()
                .map_err(|e| CacheError::Config(format!("port: {}", e)))?;
        }
        if let Some(password) = map.get("password") {
            config = config.password(password.as_str());
        }
        if let Some(timeout) = map.get("timeout") {
            config.timeout = timeout
                .trim()
                .parse()
                .map_err(|e| CacheError::Config(format!("timeout: {}", e)))?;
        }

        Ok(config)
    }

    /// Get the server host.
    pub fn get_host(&self) -> &str {
        &self.host
    }

    /// Get the server port.
    pub fn get_port(&self) -> u16 {
        self.port
    }

    /// Get the password, if authentication is enabled.
    pub fn get_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Connect timeout, or `None` when unbounded.
    pub fn connect_timeout(&self) -> Option<Duration> {
        if self.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout))
        }
    }

    /// `host:port`, used in logs and error messages.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connection URL without credentials; `AUTH` is sent separately.
    pub fn connection_url(&self) -> String {
        if self.host.contains(':') {
            format!("redis://[{}]:{}/", self.host, self.port)
        } else {
            format!("redis://{}:{}/", self.host, self.port)
        }
    }
}
