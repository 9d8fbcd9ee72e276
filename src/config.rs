//! Configuration Module
//!
//! Cache settings with defaults, environment loading and validation.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Default entry time-to-live.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default time between expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Default base tick of the sweeper loop.
pub const DEFAULT_SWEEP_TICK: Duration = Duration::from_secs(1);

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long an entry stays fresh after its last touch
    pub ttl: Duration,
    /// Minimum time between sweeps; zero disables sweeping
    pub sweep_interval: Duration,
    /// How often the sweeper checks whether a sweep is due
    pub sweep_tick: Duration,
    /// Entries to pre-allocate in the store
    pub initial_capacity: usize,
}

impl CacheConfig {
    /// Creates a config with the given TTL and default everything else.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TTL_CACHE_TTL_MS` - Entry TTL in milliseconds (default: 300000)
    /// - `TTL_CACHE_SWEEP_INTERVAL_MS` - Sweep interval in milliseconds, 0 disables (default: 3600000)
    /// - `TTL_CACHE_SWEEP_TICK_MS` - Sweeper tick in milliseconds (default: 1000)
    /// - `TTL_CACHE_INITIAL_CAPACITY` - Pre-allocated entries (default: 0)
    ///
    /// Unparseable values fall back to the default; negative durations are
    /// rejected.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            ttl: duration_from_env("TTL_CACHE_TTL_MS", "ttl", defaults.ttl)?,
            sweep_interval: duration_from_env(
                "TTL_CACHE_SWEEP_INTERVAL_MS",
                "sweep_interval",
                defaults.sweep_interval,
            )?,
            sweep_tick: duration_from_env(
                "TTL_CACHE_SWEEP_TICK_MS",
                "sweep_tick",
                defaults.sweep_tick,
            )?,
            initial_capacity: env::var("TTL_CACHE_INITIAL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.initial_capacity),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that every duration fits in u64 nanoseconds and the tick is non-zero.
    pub fn validate(&self) -> Result<()> {
        duration_to_nanos("ttl", self.ttl)?;
        duration_to_nanos("sweep_interval", self.sweep_interval)?;
        duration_to_nanos("sweep_tick", self.sweep_tick)?;
        if self.sweep_tick.is_zero() {
            return Err(CacheError::InvalidConfig(
                "sweep_tick must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            sweep_tick: DEFAULT_SWEEP_TICK,
            initial_capacity: 0,
        }
    }
}

/// Converts a duration to the nanosecond form the cache stores.
pub(crate) fn duration_to_nanos(field: &'static str, duration: Duration) -> Result<u64> {
    u64::try_from(duration.as_nanos()).map_err(|_| CacheError::DurationOverflow { field })
}

/// Parses a signed millisecond count from `var`.
fn duration_from_env(var: &str, field: &'static str, default: Duration) -> Result<Duration> {
    match env::var(var).ok().and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(ms) => duration_from_millis(field, ms),
        None => Ok(default),
    }
}

/// Rejects negative millisecond values.
pub fn duration_from_millis(field: &'static str, ms: i64) -> Result<Duration> {
    u64::try_from(ms)
        .map(Duration::from_millis)
        .map_err(|_| CacheError::NegativeDuration { field, value: ms })
}
