//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries.
//!
//! The scheduler ticks on a short fixed period; each tick checks whether the
//! cache's current sweep interval has elapsed since the last sweep. Changing
//! the interval at runtime therefore takes effect on the next tick without
//! rescheduling anything.

use std::hash::Hash;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::{CacheCore, ConcurrentStore, Entry};
use crate::clock::Clock;
use crate::tasks::{Scheduler, TaskHandle};

// == Sweeper ==
/// Per-cache sweep state, owned by the scheduled task.
pub(crate) struct Sweeper<K, V, S, C> {
    /// Weak so the task never keeps a dropped cache alive
    core: Weak<CacheCore<K, V, S, C>>,
    /// Clock reading when the last sweep ran (or the sweeper started)
    last_sweep: u64,
}

impl<K, V, S, C> Sweeper<K, V, S, C>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    S: ConcurrentStore<K, Entry<V>>,
    C: Clock,
{
    pub(crate) fn new(core: &Arc<CacheCore<K, V, S, C>>) -> Self {
        Self {
            core: Arc::downgrade(core),
            last_sweep: core.now(),
        }
    }

    // == Tick ==
    /// Sweeps if the interval has elapsed. Breaks once the cache is gone.
    pub(crate) fn tick(&mut self) -> ControlFlow<()> {
        let Some(core) = self.core.upgrade() else {
            debug!("Cache dropped, sweeper exiting");
            return ControlFlow::Break(());
        };

        let interval = core.sweep_interval();
        if interval == 0 {
            return ControlFlow::Continue(());
        }

        let now = core.now();
        if now.saturating_sub(self.last_sweep) < interval {
            return ControlFlow::Continue(());
        }

        let removed = core.clear_expired();
        self.last_sweep = now;

        // Log sweep statistics
        if removed > 0 {
            info!("TTL sweep: removed {} expired entries", removed);
        } else {
            debug!("TTL sweep: no expired entries found");
        }

        ControlFlow::Continue(())
    }
}

/// Schedules the sweeper for `core` on `scheduler`, ticking every `tick`.
///
/// The returned handle stops the task; dropping it does not.
pub(crate) fn spawn_sweeper<K, V, S, C>(
    core: &Arc<CacheCore<K, V, S, C>>,
    scheduler: &dyn Scheduler,
    tick: Duration,
) -> TaskHandle
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    S: ConcurrentStore<K, Entry<V>>,
    C: Clock,
{
    let mut sweeper = Sweeper::new(core);

    info!(
        "Starting TTL sweeper: tick {:?}, sweep interval {:?}",
        tick,
        Duration::from_nanos(core.sweep_interval())
    );

    scheduler.schedule(tick, Box::new(move || sweeper.tick()))
}
