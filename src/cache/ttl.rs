//! TTL Cache Module
//!
//! Main cache engine: writes through to a [`ConcurrentStore`] and layers
//! per-entry time-to-live on top of it.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheStats, ConcurrentStore, Entry, ShardedStore};
use crate::clock::{Clock, MonotonicClock};
use crate::config::{duration_to_nanos, CacheConfig};
use crate::error::Result;
use crate::tasks::{spawn_sweeper, DefaultScheduler, Scheduler, TaskHandle};

// == Lookup ==
/// Outcome of [`TtlCache::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    /// Present and within its TTL; the read refreshed it
    Fresh(V),
    /// Present but past its TTL; not refreshed
    Expired(V),
    /// Not in the store
    Missing,
}

impl<V> Lookup<V> {
    /// True only for [`Lookup::Fresh`]. Expired and missing are not told apart.
    pub fn found(&self) -> bool {
        matches!(self, Lookup::Fresh(_))
    }

    /// The stored value, stale or not.
    pub fn value(self) -> Option<V> {
        match self {
            Lookup::Fresh(value) | Lookup::Expired(value) => Some(value),
            Lookup::Missing => None,
        }
    }

    /// The stored value if it was fresh.
    pub fn fresh(self) -> Option<V> {
        match self {
            Lookup::Fresh(value) => Some(value),
            _ => None,
        }
    }
}

// == Cache Core ==
/// State shared between the cache handle and its sweeper.
pub(crate) struct CacheCore<K, V, S, C> {
    store: S,
    clock: C,
    /// TTL in nanoseconds
    life: AtomicU64,
    /// Sweep interval in nanoseconds, 0 = never sweep
    sweep_interval: AtomicU64,
    stats: StatsRecorder,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, S, C> CacheCore<K, V, S, C>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    S: ConcurrentStore<K, Entry<V>>,
    C: Clock,
{
    pub(crate) fn new(store: S, clock: C, life: u64, sweep_interval: u64) -> Self {
        Self {
            store,
            clock,
            life: AtomicU64::new(life),
            sweep_interval: AtomicU64::new(sweep_interval),
            stats: StatsRecorder::default(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn now(&self) -> u64 {
        self.clock.now_nanos()
    }

    // The two settings are read independently; a reader racing set_ttl may
    // see the new TTL with the old interval.
    pub(crate) fn life(&self) -> u64 {
        self.life.load(Ordering::Relaxed)
    }

    pub(crate) fn sweep_interval(&self) -> u64 {
        self.sweep_interval.load(Ordering::Relaxed)
    }

    pub(crate) fn clear_expired(&self) -> usize {
        self.clear_older_than(self.life())
    }

    // == Clear Older Than ==
    /// Deletes every entry whose age exceeds `life` nanoseconds.
    ///
    /// Keys are collected first and removed afterwards with the staleness
    /// check repeated under the slot lock, so an entry touched after the
    /// scan survives.
    pub(crate) fn clear_older_than(&self, life: u64) -> usize {
        let now = self.now();

        let mut stale = Vec::new();
        self.store.scan_while(|key, entry| {
            if entry.is_stale(now, life) {
                stale.push(key.clone());
            }
            true
        });

        let removed = stale
            .iter()
            .filter(|key| self.store.remove_if(key, |entry| entry.is_stale(now, life)))
            .count();

        self.stats.record_sweep(removed);
        removed
    }

    // == Clear All ==
    /// Deletes every entry regardless of age.
    pub(crate) fn clear_all(&self) -> usize {
        let mut keys = Vec::new();
        self.store.scan_while(|key, _| {
            keys.push(key.clone());
            true
        });

        let removed = keys.iter().filter(|key| self.store.delete(key)).count();

        self.stats.record_sweep(removed);
        removed
    }
}

// == TTL Cache ==
/// Concurrent key-value cache whose entries expire `ttl` after their last
/// touch.
///
/// Reads refresh an entry's timestamp, so frequently used keys stay alive.
/// Expired entries stay physically present until a sweep or explicit clear
/// removes them; a background sweeper does this every `sweep_interval`.
///
/// Share a cache between threads by wrapping it in an `Arc`. Dropping the
/// cache stops its sweeper.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ttlcache::TtlCache;
///
/// let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60)).unwrap();
/// cache.set("answer", 42);
/// assert_eq!(cache.get(&"answer"), Some(42));
/// assert_eq!(cache.len(), 1);
/// ```
pub struct TtlCache<K, V, S = ShardedStore<K, Entry<V>>, C = MonotonicClock> {
    core: Arc<CacheCore<K, V, S, C>>,
    sweeper: TaskHandle,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a cache with the given TTL, sweeping once an hour.
    ///
    /// The sweeper runs on the current Tokio runtime when there is one,
    /// otherwise on its own thread.
    pub fn new(ttl: Duration) -> Result<Self> {
        Self::with_config(CacheConfig::with_ttl(ttl))
    }

    /// Creates a cache with the given TTL and sweep interval.
    pub fn with_sweep_interval(ttl: Duration, sweep_interval: Duration) -> Result<Self> {
        Self::with_config(CacheConfig {
            sweep_interval,
            ..CacheConfig::with_ttl(ttl)
        })
    }

    pub fn with_config(config: CacheConfig) -> Result<Self> {
        let store = ShardedStore::with_capacity(config.initial_capacity);
        Self::with_parts(config, store, MonotonicClock::new(), &DefaultScheduler)
    }
}

impl<K, V, S, C> TtlCache<K, V, S, C>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    S: ConcurrentStore<K, Entry<V>>,
    C: Clock,
{
    /// Builds a cache from explicit collaborators.
    ///
    /// `config.initial_capacity` is ignored; size `store` yourself.
    pub fn with_parts(
        config: CacheConfig,
        store: S,
        clock: C,
        scheduler: &dyn Scheduler,
    ) -> Result<Self> {
        config.validate()?;

        let life = duration_to_nanos("ttl", config.ttl)?;
        let sweep_interval = duration_to_nanos("sweep_interval", config.sweep_interval)?;
        let core = Arc::new(CacheCore::new(store, clock, life, sweep_interval));

        let sweeper = spawn_sweeper(&core, scheduler, config.sweep_tick);

        Ok(Self { core, sweeper })
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry and
    /// resetting its TTL.
    pub fn set(&self, key: K, value: V) {
        self.core.store.set(key, Entry::new(value, self.core.now()));
    }

    // == Get ==
    /// Returns the value for `key` if it is fresh, refreshing its TTL.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.lookup(key).fresh()
    }

    // == Lookup ==
    /// Like [`get`](Self::get), but hands back an expired value too.
    ///
    /// A fresh entry is refreshed in place under the store's slot lock. An
    /// expired entry is left untouched.
    pub fn lookup(&self, key: &K) -> Lookup<V>
    where
        V: Clone,
    {
        let now = self.core.now();
        let life = self.core.life();

        let lookup = self
            .core
            .store
            .update_if_present(key, |entry| {
                if entry.is_stale(now, life) {
                    Lookup::Expired(entry.value.clone())
                } else {
                    entry.touch(now);
                    Lookup::Fresh(entry.value.clone())
                }
            })
            .unwrap_or(Lookup::Missing);

        match &lookup {
            Lookup::Fresh(_) => self.core.stats.record_hit(),
            Lookup::Expired(_) => self.core.stats.record_expired_read(),
            Lookup::Missing => self.core.stats.record_miss(),
        }
        lookup
    }

    // == Contains ==
    /// Checks logical presence without refreshing the entry.
    pub fn contains(&self, key: &K) -> bool {
        let now = self.core.now();
        let life = self.core.life();
        self.core
            .store
            .read_if_present(key, |entry| !entry.is_stale(now, life))
            .unwrap_or(false)
    }

    // == Touch ==
    /// Refreshes the TTL of a fresh entry. Missing or expired keys are left
    /// alone.
    pub fn touch(&self, key: &K) {
        let now = self.core.now();
        let life = self.core.life();
        self.core.store.update_if_present(key, |entry| {
            if !entry.is_stale(now, life) {
                entry.touch(now);
            }
        });
    }

    // == Delete ==
    /// Removes `key`. Missing keys are ignored.
    pub fn del(&self, key: &K) {
        self.core.store.delete(key);
    }

    // == Set TTL ==
    /// Changes the TTL and, if given, the sweep interval.
    ///
    /// Existing entries keep their timestamps; the new TTL applies from the
    /// next read or sweep. A zero interval disables sweeping.
    pub fn set_ttl(&self, ttl: Duration, sweep_interval: Option<Duration>) -> Result<()> {
        let life = duration_to_nanos("ttl", ttl)?;
        let interval = sweep_interval
            .map(|interval| duration_to_nanos("sweep_interval", interval))
            .transpose()?;

        self.core.life.store(life, Ordering::Relaxed);
        if let Some(interval) = interval {
            self.core.sweep_interval.store(interval, Ordering::Relaxed);
        }

        info!(?ttl, ?sweep_interval, "Cache TTL reconfigured");
        Ok(())
    }

    /// Current TTL.
    pub fn ttl(&self) -> Duration {
        Duration::from_nanos(self.core.life())
    }

    /// Current sweep interval.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_nanos(self.core.sweep_interval())
    }

    // == For Each ==
    /// Visits every physically present entry, expired ones included.
    ///
    /// Order is unspecified, and writes made concurrently may or may not be
    /// seen. `visitor` gets copies and runs without any store lock held, so
    /// it may call back into this cache (to delete what it visits, say).
    pub fn for_each(&self, mut visitor: impl FnMut(&K, &V))
    where
        V: Clone,
    {
        self.for_each_while(|key, value| {
            visitor(key, value);
            true
        });
    }

    /// Like [`for_each`](Self::for_each), stopping once `visitor` returns
    /// `false`.
    pub fn for_each_while(&self, mut visitor: impl FnMut(&K, &V) -> bool)
    where
        V: Clone,
    {
        self.core
            .store
            .for_each_while(|key, entry| visitor(key, &entry.value));
    }

    // == Length ==
    /// Number of logically present (unexpired) entries.
    ///
    /// Walks the whole store, so this is O(n) and only an estimate under
    /// concurrent writes.
    pub fn len(&self) -> usize {
        let now = self.core.now();
        let life = self.core.life();

        let mut count = 0;
        self.core.store.scan_while(|_, entry| {
            if !entry.is_stale(now, life) {
                count += 1;
            }
            true
        });
        count
    }

    pub fn is_empty(&self) -> bool {
        let now = self.core.now();
        let life = self.core.life();

        let mut empty = true;
        self.core.store.scan_while(|_, entry| {
            empty = entry.is_stale(now, life);
            empty
        });
        empty
    }

    /// Number of physically present entries, expired ones included.
    pub fn map_len(&self) -> usize {
        self.core.store.len()
    }

    /// Store occupancy as a percentage of its allocated capacity.
    pub fn fill_rate(&self) -> usize {
        self.core.store.fill_rate()
    }

    /// Starts growing the store to hold `target` entries. Returns
    /// immediately.
    pub fn grow(&self, target: usize) {
        self.core.store.grow(target);
    }

    // == Clear Expired ==
    /// Deletes every entry past the configured TTL. Returns how many were
    /// removed.
    pub fn clear_expired(&self) -> usize {
        let removed = self.core.clear_expired();
        debug!(removed, "Cleared expired entries");
        removed
    }

    // == Clear Early ==
    /// Deletes every entry older than `ttl`, ignoring the configured TTL.
    ///
    /// `None` deletes everything, including entries written at this very
    /// clock reading.
    pub fn clear_early(&self, ttl: Option<Duration>) -> usize {
        let removed = match ttl {
            Some(ttl) => {
                let life = u64::try_from(ttl.as_nanos()).unwrap_or(u64::MAX);
                self.core.clear_older_than(life)
            }
            None => self.core.clear_all(),
        };
        debug!(removed, ?ttl, "Cleared entries early");
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.core.stats.snapshot(self.core.store.len())
    }

    // == Stop Sweeper ==
    /// Stops background sweeping for good. Explicit clears still work.
    pub fn stop_sweeper(&self) {
        if !self.sweeper.is_stopped() {
            self.sweeper.stop();
            info!("Cache sweeper stopped");
        }
    }
}

impl<K, V, S, C> Drop for TtlCache<K, V, S, C> {
    fn drop(&mut self) {
        self.sweeper.stop();
    }
}

impl<K, V, S, C> fmt::Debug for TtlCache<K, V, S, C>
where
    S: ConcurrentStore<K, Entry<V>>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &Duration::from_nanos(self.core.life.load(Ordering::Relaxed)))
            .field(
                "sweep_interval",
                &Duration::from_nanos(self.core.sweep_interval.load(Ordering::Relaxed)),
            )
            .field("map_len", &self.core.store.len())
            .field("sweeper_stopped", &self.sweeper.is_stopped())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::tasks::ManualScheduler;

    const SECOND: Duration = Duration::from_secs(1);

    type ManualCache =
        TtlCache<&'static str, u32, ShardedStore<&'static str, Entry<u32>>, ManualClock>;

    fn manual_cache(ttl: Duration) -> (ManualCache, ManualClock) {
        let clock = ManualClock::new();
        let cache = TtlCache::with_parts(
            CacheConfig::with_ttl(ttl),
            ShardedStore::new(),
            clock.clone(),
            &ManualScheduler::new(),
        )
        .unwrap();
        (cache, clock)
    }

    #[test]
    fn test_set_and_get() {
        let (cache, _clock) = manual_cache(SECOND);

        cache.set("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.lookup(&"a"), Lookup::Fresh(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.map_len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let (cache, _clock) = manual_cache(SECOND);

        assert_eq!(cache.get(&"missing"), None);
        let lookup = cache.lookup(&"missing");
        assert!(!lookup.found());
        assert_eq!(lookup, Lookup::Missing);
    }

    #[test]
    fn test_expired_value_is_surfaced_but_not_found() {
        let (cache, clock) = manual_cache(SECOND);

        cache.set("a", 7);
        clock.advance(SECOND + Duration::from_nanos(1));

        let lookup = cache.lookup(&"a");
        assert!(!lookup.found());
        assert_eq!(lookup.value(), Some(7));
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn test_expired_read_does_not_refresh() {
        let (cache, clock) = manual_cache(SECOND);

        cache.set("a", 1);
        clock.advance(2 * SECOND);
        assert_eq!(cache.get(&"a"), None);

        // Widen the TTL so the entry's original timestamp decides freshness
        cache.set_ttl(3 * SECOND, None).unwrap();
        assert!(cache.contains(&"a"));
        clock.advance(SECOND + SECOND / 2);
        assert!(!cache.contains(&"a"), "expired read must not refresh");
    }

    #[test]
    fn test_freshness_boundary() {
        let (cache, clock) = manual_cache(SECOND);

        cache.set("a", 1);
        clock.advance(SECOND);
        assert!(cache.contains(&"a"), "exactly ttl old is still fresh");

        clock.advance(Duration::from_nanos(1));
        assert!(!cache.contains(&"a"));
    }

    #[test]
    fn test_get_refresh_is_durable() {
        let (cache, clock) = manual_cache(SECOND);

        cache.set("a", 1);
        clock.advance(SECOND / 2);
        assert_eq!(cache.get(&"a"), Some(1));

        // One full ttl after set, but only half after the refreshing read
        clock.advance(SECOND / 2 + Duration::from_millis(10));
        assert_eq!(cache.get(&"a"), Some(1));
    }

    #[test]
    fn test_touch_extends_life() {
        let (cache, clock) = manual_cache(SECOND);

        cache.set("a", 1);
        clock.advance(SECOND * 3 / 4);
        cache.touch(&"a");
        clock.advance(SECOND * 3 / 4);

        assert!(cache.contains(&"a"));
        assert_eq!(cache.get(&"a"), Some(1));
    }

    #[test]
    fn test_touch_ignores_missing_and_expired() {
        let (cache, clock) = manual_cache(SECOND);

        cache.touch(&"missing");
        assert_eq!(cache.map_len(), 0);

        cache.set("a", 1);
        clock.advance(2 * SECOND);
        cache.touch(&"a");

        assert!(!cache.contains(&"a"));
        assert_eq!(cache.map_len(), 1);
    }

    #[test]
    fn test_contains_does_not_refresh() {
        let (cache, clock) = manual_cache(SECOND);

        cache.set("a", 1);
        clock.advance(SECOND * 3 / 4);
        assert!(cache.contains(&"a"));
        clock.advance(SECOND * 3 / 4);
        assert!(!cache.contains(&"a"));
    }

    #[test]
    fn test_set_overwrites_and_resets_timestamp() {
        let (cache, clock) = manual_cache(SECOND);

        cache.set("a", 1);
        clock.advance(2 * SECOND);
        cache.set("a", 2);

        assert_eq!(cache.get(&"a"), Some(2));
        assert_eq!(cache.map_len(), 1);
    }

    #[test]
    fn test_del() {
        let (cache, _clock) = manual_cache(SECOND);

        cache.set("a", 1);
        cache.del(&"a");
        cache.del(&"a");

        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.map_len(), 0);
    }

    #[test]
    fn test_len_and_map_len() {
        let (cache, clock) = manual_cache(SECOND);

        cache.set("old", 1);
        clock.advance(2 * SECOND);
        cache.set("new", 2);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.map_len(), 2);
        assert!(!cache.is_empty());

        assert_eq!(cache.clear_expired(), 1);
        assert_eq!(cache.len(), cache.map_len());
    }

    #[test]
    fn test_is_empty_with_only_expired_entries() {
        let (cache, clock) = manual_cache(SECOND);
        assert!(cache.is_empty());

        cache.set("a", 1);
        clock.advance(2 * SECOND);
        assert!(cache.is_empty());
        assert_eq!(cache.map_len(), 1);
    }

    #[test]
    fn test_clear_expired_is_idempotent() {
        let (cache, clock) = manual_cache(SECOND);

        cache.set("a", 1);
        cache.set("b", 2);
        clock.advance(2 * SECOND);
        cache.set("c", 3);

        assert_eq!(cache.clear_expired(), 2);
        assert_eq!(cache.clear_expired(), 0);
        assert_eq!(cache.map_len(), 1);
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn test_clear_early_with_threshold() {
        let (cache, clock) = manual_cache(Duration::from_secs(3600));

        cache.set("old", 1);
        clock.advance(10 * SECOND);
        cache.set("recent", 2);
        clock.advance(SECOND);

        assert_eq!(cache.clear_early(Some(5 * SECOND)), 1);
        assert_eq!(cache.get(&"old"), None);
        assert_eq!(cache.get(&"recent"), Some(2));
    }

    #[test]
    fn test_clear_early_without_threshold_removes_everything() {
        let (cache, clock) = manual_cache(Duration::from_secs(3600));

        // Written at the current clock reading, so age is exactly zero
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.clear_early(None), 2);
        assert_eq!(cache.map_len(), 0);

        cache.set("c", 3);
        clock.advance(SECOND);
        cache.set("d", 4);
        assert_eq!(cache.clear_early(None), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().swept_entries, 4);
    }

    #[test]
    fn test_set_ttl() {
        let (cache, clock) = manual_cache(SECOND);

        cache.set("a", 1);
        clock.advance(2 * SECOND);
        assert!(!cache.contains(&"a"));

        // A longer TTL makes the same entry fresh again
        cache.set_ttl(10 * SECOND, None).unwrap();
        assert!(cache.contains(&"a"));
        assert_eq!(cache.ttl(), 10 * SECOND);
        assert_eq!(cache.sweep_interval(), Duration::from_secs(3600));

        cache.set_ttl(SECOND, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(cache.sweep_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_set_ttl_rejects_overflow_without_partial_update() {
        let (cache, _clock) = manual_cache(SECOND);

        let result = cache.set_ttl(2 * SECOND, Some(Duration::MAX));
        assert!(matches!(
            result,
            Err(crate::CacheError::DurationOverflow {
                field: "sweep_interval"
            })
        ));
        assert_eq!(cache.ttl(), SECOND);
    }

    #[test]
    fn test_zero_ttl() {
        let (cache, clock) = manual_cache(Duration::ZERO);

        cache.set("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));

        clock.advance(Duration::from_nanos(1));
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn test_for_each_includes_expired() {
        let (cache, clock) = manual_cache(SECOND);

        cache.set("a", 1);
        clock.advance(2 * SECOND);
        cache.set("b", 2);

        let mut seen = Vec::new();
        cache.for_each(|key, value| seen.push((*key, *value)));
        seen.sort();
        assert_eq!(seen, vec![("a", 1), ("b", 2)]);
    }

    #[test]
    fn test_for_each_visitor_can_write_to_cache() {
        let (cache, clock) = manual_cache(SECOND);
        let cache = Arc::new(cache);
        for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
            cache.set(key, i as u32);
        }

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let visiting = Arc::clone(&cache);
        let visitor_clock = clock.clone();
        std::thread::spawn(move || {
            visitor_clock.advance(SECOND / 2);
            visiting.for_each(|key, value| {
                if value % 2 == 0 {
                    visiting.del(key);
                } else {
                    visiting.touch(key);
                    visiting.get(key);
                }
            });
            let _ = done_tx.send(());
        });

        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("for_each visitor writing to the cache must not block");
        assert_eq!(cache.map_len(), 2);

        // Touched half a second in, so still fresh another 0.9s later
        clock.advance(SECOND * 9 / 10);
        assert_eq!(cache.get(&"b"), Some(1));
        assert_eq!(cache.get(&"d"), Some(3));
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn test_contains_reads_under_shared_lock() {
        let (cache, clock) = manual_cache(SECOND);
        cache.set("a", 1);

        // A shard read lock held elsewhere does not block contains
        let mut seen = Vec::new();
        cache.core.store.scan_while(|key, _| {
            seen.push(cache.contains(key));
            true
        });
        assert_eq!(seen, vec![true]);

        // contains must not refresh
        clock.advance(2 * SECOND);
        assert!(!cache.contains(&"a"));
        assert_eq!(cache.map_len(), 1);
    }

    #[test]
    fn test_for_each_while_breaks() {
        let (cache, _clock) = manual_cache(SECOND);
        for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
            cache.set(key, i as u32);
        }

        let mut visited = 0;
        cache.for_each_while(|_, _| {
            visited += 1;
            visited < 2
        });
        assert_eq!(visited, 2);
    }

    #[test]
    fn test_stats() {
        let (cache, clock) = manual_cache(SECOND);

        cache.set("a", 1);
        cache.get(&"a");
        cache.get(&"missing");
        clock.advance(2 * SECOND);
        cache.get(&"a");
        cache.clear_expired();

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expired_reads, 1);
        assert_eq!(stats.sweeps, 1);
        assert_eq!(stats.swept_entries, 1);
        assert_eq!(stats.total_entries, 0);
        assert!(stats.last_sweep_at.is_some());
    }

    #[test]
    fn test_with_parts_rejects_zero_tick() {
        let config = CacheConfig {
            sweep_tick: Duration::ZERO,
            ..CacheConfig::default()
        };
        let result: Result<ManualCache> = TtlCache::with_parts(
            config,
            ShardedStore::new(),
            ManualClock::new(),
            &ManualScheduler::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_fill_rate_and_grow() {
        let (cache, _clock) = manual_cache(SECOND);
        assert_eq!(cache.fill_rate(), 0);

        cache.grow(1024);
        cache.set("a", 1);
        assert!(cache.fill_rate() <= 100);
    }
}
