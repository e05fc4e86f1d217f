//! The seam between the engine and a replica.

use crate::error::SyncResult;
use parking_lot::RwLock;
use std::sync::Arc;
use weft_core::{Action, ApplyOutcome, Store, Version, Violation};

/// A replica the engine can read from and merge into.
pub trait SyncApplier: Send + Sync {
    /// Current per-kind version vectors.
    fn version(&self) -> SyncResult<Version>;

    /// Entity states `peer` has not seen, in stamp order.
    fn actions_since(&self, peer: &Version) -> SyncResult<Vec<Action>>;

    /// Applies a batch in the given order.
    ///
    /// Returns one outcome per action. Nothing is durable until
    /// [`SyncApplier::finish`].
    fn apply_batch(&self, actions: Vec<Action>) -> SyncResult<Vec<ApplyOutcome>>;

    /// Settles what the applied batches left behind and makes it durable.
    ///
    /// Returns the merged writes that had to be dropped afterwards, each with
    /// the constraint it broke.
    fn finish(&self) -> SyncResult<Vec<(Action, Violation)>>;
}

/// A [`SyncApplier`] over a shared [`Store`].
///
/// Each batch is applied under one write lock. [`SyncApplier::finish`]
/// settles merged cycles and commits under another, so a transfer of many
/// batches commits once.
///
/// # Example
///
/// ```rust
/// use weft_core::Store;
/// use weft_sync_engine::{StoreApplier, SyncConfig, SyncEngine};
///
/// let engine = SyncEngine::new(
///     SyncConfig::default(),
///     StoreApplier::new(Store::open_in_memory()?),
/// );
/// let version = engine.version()?;
/// assert_eq!(&version[..4], b"WFVV");
/// # Ok::<(), weft_sync_engine::SyncError>(())
/// ```
#[derive(Debug, Clone)]
pub struct StoreApplier {
    store: Arc<RwLock<Store>>,
}

impl StoreApplier {
    /// Takes ownership of a store.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self::shared(Arc::new(RwLock::new(store)))
    }

    /// Wraps a store that is shared with other users.
    #[must_use]
    pub fn shared(store: Arc<RwLock<Store>>) -> Self {
        Self { store }
    }

    /// The wrapped store.
    #[must_use]
    pub fn store(&self) -> &Arc<RwLock<Store>> {
        &self.store
    }
}

impl SyncApplier for StoreApplier {
    fn version(&self) -> SyncResult<Version> {
        Ok(self.store.read().version()?)
    }

    fn actions_since(&self, peer: &Version) -> SyncResult<Vec<Action>> {
        Ok(self.store.read().actions(peer)?)
    }

    fn apply_batch(&self, actions: Vec<Action>) -> SyncResult<Vec<ApplyOutcome>> {
        let mut store = self.store.write();
        let outcomes = actions
            .into_iter()
            .map(|action| store.apply_action(action))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(outcomes)
    }

    fn finish(&self) -> SyncResult<Vec<(Action, Violation)>> {
        let mut store = self.store.write();
        let removed = store.settle()?;
        store.commit()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{Id, Label};

    #[test]
    fn finish_commits_applied_batches() {
        let source = StoreApplier::new(Store::open_in_memory().unwrap());
        source
            .store()
            .write()
            .set_node(Id::mint(), Label(1))
            .unwrap();

        let target = StoreApplier::new(Store::open_in_memory().unwrap());
        let actions = source.actions_since(&target.version().unwrap()).unwrap();
        let outcomes = target.apply_batch(actions).unwrap();
        assert_eq!(outcomes, vec![ApplyOutcome::Applied]);
        assert!(target.store().write().barrier().unwrap().is_empty());
        assert!(target.finish().unwrap().is_empty());

        let mut store = target.store().write();
        assert_eq!(store.sequence().as_u64(), 1);
        assert_eq!(store.barrier().unwrap().len(), 1);
    }

    #[test]
    fn finish_reports_edges_dropped_from_cycles() {
        let link = Label(2);
        let source = StoreApplier::new(Store::open_in_memory().unwrap());
        let target = StoreApplier::new(Store::open_in_memory().unwrap());
        let (x, y) = (Id::mint(), Id::mint());
        let back = Id::mint();
        target.store().write().declare_acyclic(link).unwrap();
        target.store().write().set_edge(Id::mint(), x, link, y).unwrap();
        source.store().write().set_edge(back, y, link, x).unwrap();

        let actions = source.actions_since(&target.version().unwrap()).unwrap();
        target.apply_batch(actions).unwrap();
        let removed = target.finish().unwrap();
        assert_eq!(removed.len(), 1);
        assert!(matches!(removed[0].1, Violation::Acyclic { .. }));
        let store = target.store().read();
        assert_eq!(store.graph().edges().counts().live, 1);
    }

    #[test]
    fn closed_store_fails_the_batch() {
        let applier = StoreApplier::new(Store::open_in_memory().unwrap());
        applier.store().write().close().unwrap();
        assert!(applier.version().unwrap_err().is_closed());
    }
}
