//! CLI command implementations.

pub mod compact;
pub mod dump_journal;
pub mod inspect;
pub mod verify;
pub mod version_vector;

use crate::error::{CliError, CliResult};
use std::path::Path;
use weft_core::{Config, Store, StoreDir};
use weft_storage::{FileBackend, StorageBackend};

/// Opens an existing store, refusing to create one.
fn open_existing(path: &Path) -> CliResult<Store> {
    ensure_store(path)?;
    Ok(Store::open_with_config(
        path,
        Config::new().create_if_missing(false),
    )?)
}

/// Reads the raw journal bytes without taking the store lock.
fn read_journal(path: &Path) -> CliResult<Vec<u8>> {
    ensure_store(path)?;
    let backend = FileBackend::open(&StoreDir::journal_path_in(path))?;
    let size = backend.size()?;
    Ok(backend.read_at(0, size as usize)?)
}

fn ensure_store(path: &Path) -> CliResult<()> {
    if StoreDir::journal_path_in(path).exists() {
        Ok(())
    } else {
        Err(CliError::NoStore(path.to_path_buf()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use weft_core::{Id, Label, Store};

    /// A store directory with `commits` committed frames.
    pub(crate) fn store_dir(commits: usize) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        for _ in 0..commits {
            store.set_node(Id::mint(), Label(1)).unwrap();
            store.commit().unwrap();
        }
        store.close().unwrap();
        dir
    }
}
