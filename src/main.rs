//! ttlcache soak runner
//!
//! Drives a cache with a steady read/write load and periodically logs its
//! statistics, so TTL and sweep settings can be observed end to end.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttlcache::{CacheConfig, TtlCache};

/// Distinct keys the workload cycles through
const KEY_SPACE: u64 = 10_000;

/// Main entry point for the soak runner.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache (its sweeper starts on this runtime)
/// 4. Run the workload and stats reporter until SIGINT/SIGTERM
/// 5. Stop the sweeper and log final statistics
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttlcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ttlcache soak runner");

    let config = CacheConfig::from_env().context("invalid cache configuration")?;
    info!(
        "Configuration loaded: ttl={:?}, sweep_interval={:?}, sweep_tick={:?}, initial_capacity={}",
        config.ttl, config.sweep_interval, config.sweep_tick, config.initial_capacity
    );

    let cache: Arc<TtlCache<u64, String>> =
        Arc::new(TtlCache::with_config(config).context("failed to build cache")?);
    info!("Cache initialized");

    let workload = tokio::spawn(run_workload(Arc::clone(&cache)));
    let reporter = tokio::spawn(report_stats(Arc::clone(&cache)));

    shutdown_signal().await;

    workload.abort();
    reporter.abort();
    cache.stop_sweeper();

    let stats = serde_json::to_string(&cache.stats()).context("failed to encode stats")?;
    info!("Final stats: {}", stats);
    info!("Shutdown complete");
    Ok(())
}

/// Writes one key and reads another every millisecond.
async fn run_workload(cache: Arc<TtlCache<u64, String>>) {
    let mut ticker = interval(Duration::from_millis(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut n: u64 = 0;
    loop {
        ticker.tick().await;
        let key = n % KEY_SPACE;
        cache.set(key, format!("value-{}", n));
        // Read a key written a while ago; it may or may not have expired
        cache.get(&((n / 2) % KEY_SPACE));
        n = n.wrapping_add(1);
    }
}

/// Logs statistics as JSON every five seconds.
async fn report_stats(cache: Arc<TtlCache<u64, String>>) {
    let mut ticker = interval(Duration::from_secs(5));
    loop {
        ticker.tick().await;
        match serde_json::to_string(&cache.stats()) {
            Ok(stats) => info!(
                live = cache.len(),
                fill_rate = cache.fill_rate(),
                "Cache stats: {}",
                stats
            ),
            Err(err) => warn!("Failed to encode stats: {}", err),
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
