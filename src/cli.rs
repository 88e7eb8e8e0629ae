//! Command-line interface definitions.
//!
//! This module defines the CLI structure for the cache client using clap.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{RedisConfig, DEFAULT_PORT};
use crate::driver::DEFAULT_SCAN_COUNT;
use crate::namespace::Namespace;

/// Namespaced Redis cache client.
///
/// A CLI tool for inspecting and editing one application's cache namespace.
#[derive(Parser, Debug)]
#[command(name = "cache-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Redis host.
    #[arg(long, global = true, env = "CACHE_REDIS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Redis port.
    #[arg(long, global = true, env = "CACHE_REDIS_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Redis password.
    #[arg(long, global = true, env = "CACHE_REDIS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Connect timeout in seconds (0 = none).
    #[arg(long, global = true, env = "CACHE_REDIS_TIMEOUT", default_value_t = 0)]
    pub timeout: u64,

    /// Use the shared namespace instead of a per-application one.
    #[arg(long, global = true, conflicts_with = "root")]
    pub shared: bool,

    /// Application root the namespace is derived from (default: current dir).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Keys requested per SCAN round.
    #[arg(long, global = true, default_value_t = DEFAULT_SCAN_COUNT)]
    pub scan_count: usize,

    /// The command to execute.
    #[clap(subcommand)]
    pub command: ClientCommand,
}

/// Available client commands.
#[derive(Subcommand, Debug)]
pub enum ClientCommand {
    /// Get a value by key.
    ///
    /// Prints the stored JSON value, or nothing if the key doesn't exist.
    Get {
        /// The key to look up.
        key: String,
    },

    /// Set a key-value pair.
    ///
    /// The value is parsed as JSON; anything else is stored as a string.
    Set {
        /// The key to store the value under.
        key: String,
        /// The value to store.
        value: String,
        /// Expire after this many seconds (0 = never).
        #[arg(short, long, default_value_t = 0)]
        expire: i64,
    },

    /// Delete a key.
    Delete {
        /// The key to delete.
        key: String,
    },

    /// Delete every key starting with a prefix.
    DeletePrefix {
        /// The key prefix.
        prefix: String,
    },

    /// Delete every key in the namespace.
    Clear,

    /// Show the remaining lifetime of a key in seconds (-1 = none/missing).
    Ttl {
        /// The key to inspect.
        key: String,
    },

    /// Print every key and value starting with a prefix.
    GetAll {
        /// The key prefix.
        prefix: String,
    },

    /// List keys starting with a prefix.
    Keys {
        /// The key prefix (default: all keys in the namespace).
        #[arg(default_value = "")]
        prefix: String,
    },

    /// Ping the server.
    ///
    /// Checks if the server is reachable with the given credentials.
    Ping,
}

impl Cli {
    /// Connection settings from the global options.
    pub fn redis_config(&self) -> RedisConfig {
        let mut config = RedisConfig::new()
            .host(self.host.as_str())
            .port(self.port)
            .timeout(self.timeout);
        if let Some(password) = &self.password {
            config = config.password(password.as_str());
        }
        config.build()
    }

    /// Namespace selected by `--shared` / `--root`, relative to `cwd`.
    pub fn namespace(&self, cwd: &Path) -> Namespace {
        let root = self.root.as_deref().unwrap_or(cwd);
        Namespace::new(self.shared, root)
    }
}

/// Interpret a command-line value: JSON when it parses, a string otherwise.
pub fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::SHARED_PREFIX;

    #[test]
    fn test_parse_get() {
        let cli = Cli::parse_from(["test", "get", "mykey"]);
        match cli.command {
            ClientCommand::Get { key } => assert_eq!(key, "mykey"),
            _ => panic!("Expected Get command"),
        }
    }

    #[test]
    fn test_parse_set_with_expire() {
        let cli = Cli::parse_from(["test", "set", "mykey", "{\"a\":1}", "--expire", "60"]);
        match cli.command {
            ClientCommand::Set { key, value, expire } => {
                assert_eq!(key, "mykey");
                assert_eq!(value, "{\"a\":1}");
                assert_eq!(expire, 60);
            }
            _ => panic!("Expected Set command"),
        }
    }

    #[test]
    fn test_parse_bulk_commands() {
        let cli = Cli::parse_from(["test", "delete-prefix", "user:"]);
        assert!(matches!(cli.command, ClientCommand::DeletePrefix { prefix } if prefix == "user:"));

        let cli = Cli::parse_from(["test", "clear"]);
        assert!(matches!(cli.command, ClientCommand::Clear));

        let cli = Cli::parse_from(["test", "keys"]);
        assert!(matches!(cli.command, ClientCommand::Keys { prefix } if prefix.is_empty()));
    }

    #[test]
    fn test_global_connection_options() {
        let cli = Cli::parse_from([
            "test", "--host", "redis.local", "--port", "6380", "--password", "pw", "--timeout",
            "5", "ping",
        ]);
        let config = cli.redis_config();
        assert_eq!(config.addr(), "redis.local:6380");
        assert_eq!(config.get_password(), Some("pw"));
        assert_eq!(config.timeout, 5);
    }

    #[test]
    fn test_namespace_selection() {
        let cli = Cli::parse_from(["test", "--shared", "clear"]);
        assert_eq!(cli.namespace(Path::new("/x")).prefix(), SHARED_PREFIX);

        let cli = Cli::parse_from(["test", "--root", "/srv/app", "clear"]);
        assert_eq!(
            cli.namespace(Path::new("/x")),
            Namespace::for_root("/srv/app")
        );

        let cli = Cli::parse_from(["test", "clear"]);
        assert_eq!(cli.namespace(Path::new("/x")), Namespace::for_root("/x"));
    }

    #[test]
    fn test_shared_conflicts_with_root() {
        let result = Cli::try_parse_from(["test", "--shared", "--root", "/a", "clear"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), serde_json::json!(42));
        assert_eq!(parse_value("{\"a\":true}"), serde_json::json!({"a": true}));
        assert_eq!(parse_value("hello world"), serde_json::json!("hello world"));
    }
}
