//! Cache Module
//!
//! Provides the TTL cache and the concurrent store it writes through to.

mod entry;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use entry::Entry;
pub use stats::CacheStats;
pub use store::{ConcurrentStore, ShardedStore};
pub use ttl::{Lookup, TtlCache};

pub(crate) use ttl::CacheCore;
