//! Store statistics.
//!
//! Operation counters are atomic so read paths can bump them through `&self`.
//! [`StoreStats::snapshot`] copies them into a plain struct.

use crate::graph::TableCounts;
use crate::types::SequenceNumber;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Operation counters of one open store.
#[derive(Debug, Default)]
pub struct StoreStats {
    reads: AtomicU64,
    index_queries: AtomicU64,
    writes: AtomicU64,
    rejected_writes: AtomicU64,
    commits: AtomicU64,
    compactions: AtomicU64,
    merged: AtomicU64,
    ignored: AtomicU64,
}

impl StoreStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index_query(&self) {
        self.index_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected_write(&self) {
        self.rejected_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_compaction(&self) {
        self.compactions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_merged(&self) {
        self.merged.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads.load(Ordering::Relaxed),
            index_queries: self.index_queries.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            rejected_writes: self.rejected_writes.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            compactions: self.compactions.load(Ordering::Relaxed),
            merged: self.merged.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`StoreStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Point lookups.
    pub reads: u64,
    /// Index queries.
    pub index_queries: u64,
    /// Local writes that changed a payload.
    pub writes: u64,
    /// Local writes refused by a constraint.
    pub rejected_writes: u64,
    /// Commits that persisted something.
    pub commits: u64,
    /// Journal compactions.
    pub compactions: u64,
    /// Remote actions applied.
    pub merged: u64,
    /// Remote actions dropped as duplicate, superseded or rejected.
    pub ignored: u64,
}

/// Size of a store's contents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GraphStats {
    /// Node counts.
    pub nodes: TableCounts,
    /// Edge counts.
    pub edges: TableCounts,
    /// Atom counts.
    pub atoms: TableCounts,
    /// Entities touched since the last commit.
    pub staged: usize,
    /// Committed events not yet drained.
    pub undrained: usize,
    /// Sequence of the last commit.
    pub sequence: SequenceNumber,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        assert_eq!(StoreStats::new().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn counters_accumulate() {
        let stats = StoreStats::new();
        stats.record_read();
        stats.record_read();
        stats.record_write();
        stats.record_merged();
        stats.record_ignored();
        stats.record_ignored();

        let snap = stats.snapshot();
        assert_eq!(snap.reads, 2);
        assert_eq!(snap.writes, 1);
        assert_eq!(snap.merged, 1);
        assert_eq!(snap.ignored, 2);
        assert_eq!(snap.commits, 0);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(StoreStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        s.record_index_query();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(stats.snapshot().index_queries, 800);
    }
}
