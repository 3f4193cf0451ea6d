use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Update threshold attached to every stored record.
///
/// Thresholds form a total order. A write carrying threshold `t` is stale
/// when the store already holds the same primary key (or a tombstone for it)
/// stamped with a threshold strictly greater than `t`. Writes stamped with
/// [`Threshold::ZERO`] are unguarded.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Threshold(u64);

impl Threshold {
    /// The zero threshold, carried by unguarded writes.
    pub const ZERO: Self = Self(0);

    /// Create a threshold from a raw value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw value.
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns `true` if this is the zero threshold.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if this threshold is strictly after `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self > other
    }

    /// Returns `true` if a write stamped with `self` must not replace state
    /// stamped with `stored`.
    pub fn is_stale_against(&self, stored: &Self) -> bool {
        !self.is_zero() && stored > self
    }
}

impl fmt::Debug for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Threshold({})", self.0)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl From<u64> for Threshold {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Issues strictly increasing [`Threshold`] values.
///
/// One clock is shared by every collector writing into the same store, so
/// thresholds stamped by a Reconcile pass and by watch events are directly
/// comparable.
///
/// # Rules
///
/// - **Tick**: `next = max(wall_clock_us, last + 1)`. Seeding from the wall
///   clock keeps values increasing across process restarts.
/// - **Observe**: advancing past an externally supplied threshold guarantees
///   the next tick is strictly greater than it.
#[derive(Debug)]
pub struct ThresholdClock {
    last: AtomicU64,
}

impl ThresholdClock {
    /// Create a clock seeded from the current wall-clock time.
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a clock whose first tick is at least `floor + 1`.
    pub fn starting_at(floor: u64) -> Self {
        Self {
            last: AtomicU64::new(floor),
        }
    }

    /// Generate the next threshold.
    ///
    /// The returned value is strictly greater than any value previously
    /// returned or observed by this clock.
    pub fn tick(&self) -> Threshold {
        let wall = Self::wall_clock_us();
        let mut next = 0;
        // fetch_update retries on contention; the closure never declines.
        let _ = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                next = wall.max(last.saturating_add(1));
                Some(next)
            });
        Threshold(next)
    }

    /// Advance the clock so that subsequent ticks are after `seen`.
    pub fn observe(&self, seen: Threshold) {
        self.last.fetch_max(seen.0, Ordering::SeqCst);
    }

    /// The most recently issued (or observed) threshold.
    pub fn current(&self) -> Threshold {
        Threshold(self.last.load(Ordering::SeqCst))
    }

    fn wall_clock_us() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64
    }
}

impl Default for ThresholdClock {
    fn default() -> Self {
        Self::new()
    }
}
