//! ttlcache - A concurrent in-process cache with time-to-live expiry
//!
//! Entries expire a fixed TTL after their last touch. Reads refresh the
//! TTL, and a background sweeper reclaims expired entries.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, ConcurrentStore, Entry, Lookup, ShardedStore, TtlCache};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::{
    DefaultScheduler, ManualScheduler, Scheduler, TaskHandle, ThreadScheduler, TokioScheduler,
};
