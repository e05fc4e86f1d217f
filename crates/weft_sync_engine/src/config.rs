//! Configuration for the sync engine.

/// Configuration for sync operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Maximum number of actions placed in one actions blob.
    pub batch_size: usize,
    /// Maximum number of pull or push rounds in one [`sync_with`] cycle.
    ///
    /// [`sync_with`]: crate::SyncEngine::sync_with
    pub max_rounds: usize,
}

impl SyncConfig {
    /// Creates a configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            batch_size: 1024,
            max_rounds: 64,
        }
    }

    /// Sets the batch size. Zero is treated as one.
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Sets the round limit. Zero is treated as one.
    #[must_use]
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds.max(1);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let config = SyncConfig::new().with_batch_size(10).with_max_rounds(3);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_rounds, 3);
    }

    #[test]
    fn zero_limits_are_clamped() {
        let config = SyncConfig::new().with_batch_size(0).with_max_rounds(0);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.max_rounds, 1);
    }
}
