//! Memcache - A lightweight in-process expiring cache
//!
//! Demo entry point: builds a cache from the environment and walks through
//! insert, expiry and sweep.

use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memcache::{Cache, CacheError, Config, Expiration};

/// Main entry point for the demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache (starts the sweeper when enabled)
/// 4. Run the demo, or stop early on Ctrl+C
/// 5. Destroy the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: default_expiration={:?}, sweep_interval={:?}, count_mode={:?}",
        config.default_expiration, config.sweep_interval, config.count_mode
    );

    let cache: Cache<String> = Cache::from_config(&config);

    tokio::select! {
        result = run_demo(&cache) => result?,
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping demo");
        }
    }

    cache.destroy().context("Failed to destroy cache")?;
    info!("Demo complete");
    Ok(())
}

async fn run_demo(cache: &Cache<String>) -> anyhow::Result<()> {
    cache.add("mykey", "myvalue".to_string(), Duration::from_secs(300));
    cache.add("second", "second value".to_string(), Expiration::Default);
    cache.add("third", "short lived".to_string(), Duration::from_secs(1));

    println!("third exists: {}", cache.exists("third"));
    println!("count: {}", cache.count());

    // Long enough for "third" to expire and at least one sweep to run
    let wait = Duration::from_millis(1500) + cache.sweep_interval();
    info!("Waiting {:?} for expiry", wait);
    tokio::time::sleep(wait).await;

    println!("count: {}", cache.count());
    match cache.get("third") {
        Ok(value) => println!("third: {}", value),
        Err(CacheError::Expired(key)) => warn!("'{}' expired but has not been swept", key),
        Err(e) => println!("third: {}", e),
    }
    println!("mykey: {}", cache.get("mykey")?);

    let stats = serde_json::to_string(&cache.stats()).context("Failed to encode stats")?;
    println!("stats: {}", stats);
    Ok(())
}
