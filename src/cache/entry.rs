//! Cache Entry Module
//!
//! Pairs a stored value with the time it was last touched.

// == Cache Entry ==
/// A single cache slot: the value plus its last-touched timestamp.
///
/// `last_touched` is a reading from the owning cache's [`Clock`](crate::Clock)
/// and is the only input to staleness decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// Last touch, in clock nanoseconds
    pub last_touched: u64,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates an entry touched at `now`.
    pub fn new(value: V, now: u64) -> Self {
        Self {
            value,
            last_touched: now,
        }
    }

    // == Age ==
    /// Nanoseconds since the last touch.
    ///
    /// A timestamp ahead of `now` (another thread stamped it after our clock
    /// read) counts as age zero.
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_touched)
    }

    // == Is Stale ==
    /// Checks whether the entry has outlived `life`.
    ///
    /// Boundary condition: an entry whose age equals `life` exactly is still
    /// fresh; it turns stale only once the age is strictly greater.
    pub fn is_stale(&self, now: u64, life: u64) -> bool {
        self.age(now) > life
    }

    // == Touch ==
    /// Resets the staleness clock to `now`. Never moves the timestamp
    /// backwards.
    pub fn touch(&mut self, now: u64) {
        if now > self.last_touched {
            self.last_touched = now;
        }
    }
}
