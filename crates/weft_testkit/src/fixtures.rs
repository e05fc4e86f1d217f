//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common graph shapes.

use std::path::Path;
use tempfile::TempDir;
use weft_core::{Config, Store};

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: Store::open_in_memory().expect("Failed to open in-memory store"),
            temp_dir: None,
        }
    }

    /// Creates a new file-backed test store in a temporary directory.
    pub fn file() -> Self {
        Self::file_with_config(Config::default())
    }

    /// Creates a file-backed test store with custom configuration.
    pub fn file_with_config(config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store =
            Store::open_with_config(temp_dir.path(), config).expect("Failed to open file store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store directory if file-backed, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Closes the store and opens the same directory again.
    ///
    /// # Panics
    ///
    /// Panics for in-memory stores.
    pub fn reopen(self, config: Config) -> Self {
        let Self { mut store, temp_dir } = self;
        let temp_dir = temp_dir.expect("Only file stores can be reopened");
        store.close().expect("Failed to close store");
        drop(store);
        let store =
            Store::open_with_config(temp_dir.path(), config).expect("Failed to reopen store");
        Self {
            store,
            temp_dir: Some(temp_dir),
        }
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl std::ops::DerefMut for TestStore {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.store
    }
}

/// Runs a test with a temporary in-memory store.
///
/// # Example
///
/// ```rust
/// use weft_core::{Id, Label};
/// use weft_testkit::with_temp_store;
///
/// with_temp_store(|store| {
///     let id = Id::mint();
///     store.set_node(id, Label(1)).unwrap();
///     assert!(store.node(id).unwrap().is_some());
/// });
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&mut Store) -> R,
{
    let mut test_store = TestStore::memory();
    f(&mut test_store.store)
}

/// Runs a test with a temporary file-backed store.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&mut Store, &Path) -> R,
{
    let mut test_store = TestStore::file();
    let dir = test_store
        .temp_dir
        .take()
        .expect("File store should have a directory");
    let result = f(&mut test_store.store, dir.path());
    drop(test_store);
    drop(dir);
    result
}

/// Common graph shapes.
pub mod scenarios {
    use super::*;
    use weft_core::{Id, Label};

    /// Label used for nodes in the scenarios.
    pub const NODE: Label = Label(1);
    /// Label used for edges in the scenarios.
    pub const NEXT: Label = Label(2);
    /// Label used for atoms in the scenarios.
    pub const NAME: Label = Label(3);

    /// A committed chain `n0 -> n1 -> ... -> n(len-1)` with a name atom on
    /// every node. Returns the store and the node ids in chain order.
    pub fn chain(len: usize) -> (TestStore, Vec<Id>) {
        let mut test_store = TestStore::memory();
        let nodes: Vec<Id> = (0..len).map(|_| Id::mint()).collect();
        for (i, &node) in nodes.iter().enumerate() {
            test_store.set_node(node, NODE).expect("Failed to set node");
            test_store
                .set_atom(Id::mint(), node, NAME, format!("node-{i}").into_bytes())
                .expect("Failed to set atom");
        }
        for pair in nodes.windows(2) {
            test_store
                .set_edge(Id::mint(), pair[0], NEXT, pair[1])
                .expect("Failed to set edge");
        }
        test_store.commit().expect("Failed to commit");
        (test_store, nodes)
    }
}
