//! Namespaced cache client.
//!
//! This binary runs one cache operation against a Redis server and prints
//! the result. Logging goes to stderr (`RUST_LOG`, default `warn`).

use clap::Parser;
use serde_json::Value;

use scoped_cache_driver::cli::{parse_value, Cli, ClientCommand};
use scoped_cache_driver::{CacheDriver, RedisStore};

pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cwd = std::env::current_dir()?;
    let namespace = args.namespace(&cwd);
    let mut cache = CacheDriver::new(RedisStore::new(args.redis_config()), namespace)
        .scan_count(args.scan_count);

    let result = match args.command {
        ClientCommand::Get { key } => cache.fetch::<Value>(&key).map(|value| match value {
            Some(value) => println!("{}", value),
            None => eprintln!("Key '{}' not found", key),
        }),

        ClientCommand::Set { key, value, expire } => cache
            .set(&key, &parse_value(&value), expire)
            .map(|()| println!("Set key '{}'", key)),

        ClientCommand::Delete { key } => cache.delete(&key).map(|removed| {
            if removed {
                println!("Deleted key '{}'", key);
            } else {
                println!("Key '{}' not found", key);
            }
        }),

        ClientCommand::DeletePrefix { prefix } => cache
            .delete_key_start_with(&prefix)
            .map(|removed| println!("Deleted {} key(s) starting with '{}'", removed, prefix)),

        ClientCommand::Clear => cache.clear().map(|removed| {
            println!("Cleared {} key(s) from {}", removed, cache.namespace().prefix())
        }),

        ClientCommand::Ttl { key } => cache.get_ttl(&key).map(|ttl| println!("{}", ttl)),

        ClientCommand::GetAll { prefix } => cache.get_all::<Value>(&prefix).map(|values| {
            for (key, value) in values {
                println!("{}\t{}", key, value);
            }
        }),

        ClientCommand::Keys { prefix } => cache.keys(&prefix).map(|keys| {
            for key in keys {
                println!("{}", key);
            }
        }),

        ClientCommand::Ping => cache.ping().map(|()| println!("PONG")),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if e.is_connection() {
            eprintln!("Make sure the Redis server is reachable and the credentials are correct.");
        }
        std::process::exit(1);
    }

    Ok(())
}
