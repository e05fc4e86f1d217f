//! Store configuration.

use crate::constraints::Constraints;
use crate::types::OriginId;

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the store directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to sync the journal on every commit (safer but slower).
    pub sync_on_commit: bool,

    /// Journal size that triggers compaction after a commit.
    pub max_journal_size: u64,

    /// Whether new stamps are pulled forward to wall-clock nanoseconds.
    ///
    /// Off, the clock is a plain Lamport counter.
    pub hybrid_clock: bool,

    /// Origin id for a new store, or to replace the persisted one.
    ///
    /// `None` keeps the persisted origin, or picks a random one for a new store.
    pub origin: Option<OriginId>,

    /// Constraints declared when the store opens.
    pub constraints: Constraints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_commit: true,
            max_journal_size: 16 * 1024 * 1024, // 16 MB
            hybrid_clock: true,
            origin: None,
            constraints: Constraints::new(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store directory if missing.
    #[must_use]
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to sync the journal on every commit.
    #[must_use]
    pub fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }

    /// Sets the journal size that triggers compaction.
    #[must_use]
    pub fn max_journal_size(mut self, size: u64) -> Self {
        self.max_journal_size = size;
        self
    }

    /// Sets whether the clock follows wall time.
    #[must_use]
    pub fn hybrid_clock(mut self, value: bool) -> Self {
        self.hybrid_clock = value;
        self
    }

    /// Sets the origin id.
    #[must_use]
    pub fn origin(mut self, origin: OriginId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Sets the constraints declared on open.
    #[must_use]
    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}
