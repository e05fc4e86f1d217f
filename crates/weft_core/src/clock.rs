//! Logical clock, stamps and version vectors.
//!
//! Every write is stamped with `(clock, origin)`. Stamps order by clock first
//! and origin second; that order decides which of two concurrent writes to the
//! same entity survives. Each replica keeps, per entity kind, the highest clock
//! it has seen from every origin.

use crate::types::OriginId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Ordering tag attached to every write.
///
/// The derived ordering compares `clock` and then `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stamp {
    /// Logical time of the write.
    pub clock: u64,
    /// Replica that made the write.
    pub origin: OriginId,
}

impl Stamp {
    /// Creates a stamp.
    #[must_use]
    pub const fn new(clock: u64, origin: OriginId) -> Self {
        Self { clock, origin }
    }
}

/// Lamport clock, optionally pulled forward by wall time.
#[derive(Debug, Clone)]
pub struct Clock {
    origin: OriginId,
    last: u64,
    hybrid: bool,
}

impl Clock {
    /// Creates a clock that has issued nothing yet.
    #[must_use]
    pub const fn new(origin: OriginId, hybrid: bool) -> Self {
        Self {
            origin,
            last: 0,
            hybrid,
        }
    }

    /// Creates a clock resuming after `last`.
    #[must_use]
    pub const fn resume(origin: OriginId, last: u64, hybrid: bool) -> Self {
        Self {
            origin,
            last,
            hybrid,
        }
    }

    /// Origin stamped onto every issued stamp.
    #[must_use]
    pub const fn origin(&self) -> OriginId {
        self.origin
    }

    /// Highest clock issued or observed.
    #[must_use]
    pub const fn last(&self) -> u64 {
        self.last
    }

    /// Issues a stamp strictly greater than any issued or observed before.
    pub fn tick(&mut self) -> Stamp {
        let mut next = self.last.saturating_add(1);
        if self.hybrid {
            next = next.max(wall_nanos());
        }
        self.last = next;
        Stamp::new(next, self.origin)
    }

    /// Moves the clock past a clock value seen from another replica.
    pub fn observe(&mut self, clock: u64) {
        self.last = self.last.max(clock);
    }
}

fn wall_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Highest clock seen per origin.
///
/// Origins never seen read as clock 0; real stamps start at 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionVector(BTreeMap<OriginId, u64>);

impl VersionVector {
    /// Creates an empty vector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest clock seen from `origin`.
    #[must_use]
    pub fn get(&self, origin: OriginId) -> u64 {
        self.0.get(&origin).copied().unwrap_or(0)
    }

    /// Returns true if `stamp` is at or below what has been seen from its origin.
    #[must_use]
    pub fn covers(&self, stamp: Stamp) -> bool {
        stamp.clock <= self.get(stamp.origin)
    }

    /// Records `stamp`. Returns false if it was already covered.
    pub fn observe(&mut self, stamp: Stamp) -> bool {
        let entry = self.0.entry(stamp.origin).or_insert(0);
        if stamp.clock > *entry {
            *entry = stamp.clock;
            true
        } else {
            false
        }
    }

    /// Takes the per-origin maximum with `other`.
    pub fn merge(&mut self, other: &Self) {
        for (&origin, &clock) in &other.0 {
            self.observe(Stamp::new(clock, origin));
        }
    }

    /// Iterates `(origin, clock)` pairs in origin order.
    pub fn iter(&self) -> impl Iterator<Item = (OriginId, u64)> + '_ {
        self.0.iter().map(|(&origin, &clock)| (origin, clock))
    }

    /// Number of origins seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing has been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(OriginId, u64)> for VersionVector {
    fn from_iter<I: IntoIterator<Item = (OriginId, u64)>>(iter: I) -> Self {
        let mut vector = Self::new();
        for (origin, clock) in iter {
            vector.observe(Stamp::new(clock, origin));
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: OriginId = OriginId::new(1);
    const B: OriginId = OriginId::new(2);

    #[test]
    fn stamps_order_by_clock_then_origin() {
        assert!(Stamp::new(1, B) < Stamp::new(2, A));
        assert!(Stamp::new(3, A) < Stamp::new(3, B));
    }

    #[test]
    fn tick_is_strictly_increasing() {
        let mut clock = Clock::new(A, false);
        let first = clock.tick();
        let second = clock.tick();
        assert_eq!(first, Stamp::new(1, A));
        assert_eq!(second, Stamp::new(2, A));
    }

    #[test]
    fn observe_moves_clock_forward_only() {
        let mut clock = Clock::resume(A, 10, false);
        clock.observe(4);
        assert_eq!(clock.last(), 10);
        clock.observe(20);
        assert_eq!(clock.tick().clock, 21);
    }

    #[test]
    fn hybrid_clock_tracks_wall_time() {
        let mut clock = Clock::new(A, true);
        let stamp = clock.tick();
        assert!(stamp.clock > 1_000_000_000);
        assert!(clock.tick() > stamp);
    }

    #[test]
    fn vector_observe_and_covers() {
        let mut vector = VersionVector::new();
        assert!(!vector.covers(Stamp::new(1, A)));
        assert!(vector.observe(Stamp::new(5, A)));
        assert!(!vector.observe(Stamp::new(5, A)));
        assert!(!vector.observe(Stamp::new(3, A)));
        assert!(vector.covers(Stamp::new(5, A)));
        assert!(!vector.covers(Stamp::new(6, A)));
        assert_eq!(vector.get(B), 0);
    }

    #[test]
    fn vector_merge_takes_maximum() {
        let mut left: VersionVector = [(A, 5), (B, 1)].into_iter().collect();
        let right: VersionVector = [(A, 2), (B, 7)].into_iter().collect();
        left.merge(&right);
        assert_eq!(left.get(A), 5);
        assert_eq!(left.get(B), 7);
        assert_eq!(left.len(), 2);
    }
}
