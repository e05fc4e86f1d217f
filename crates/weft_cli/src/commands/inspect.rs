//! Inspect command implementation.

use super::open_existing;
use crate::error::CliResult;
use crate::Format;
use serde::Serialize;
use std::path::Path;
use weft_core::{GraphStats, StoreDir};
use weft_storage::{FileBackend, StorageBackend};

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    /// Store path.
    pub path: String,
    /// Journal size in bytes.
    pub journal_size: u64,
    /// Number of journal frames.
    pub journal_frames: usize,
    /// Origin id of the store.
    pub origin: u64,
    /// Entity counts and log sizes.
    pub graph: GraphStats,
}

/// Collects the inspection report.
pub fn inspect(path: &Path) -> CliResult<InspectReport> {
    let mut store = open_existing(path)?;
    let journal_size = FileBackend::open(&StoreDir::journal_path_in(path))?.size()?;
    let report = InspectReport {
        path: path.display().to_string(),
        journal_size,
        journal_frames: store.journal_frames(),
        origin: store.origin().as_u64(),
        graph: store.graph_stats()?,
    };
    store.close()?;
    Ok(report)
}

/// Runs the inspect command.
pub fn run(path: &Path, format: Format) -> CliResult<()> {
    let report = inspect(path)?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print_text(&report),
    }
    Ok(())
}

fn print_text(report: &InspectReport) {
    let graph = &report.graph;
    println!("Store: {}", report.path);
    println!("Origin: {:016x}", report.origin);
    println!("Sequence: {}", graph.sequence.as_u64());
    println!(
        "Journal: {} bytes in {} frame(s)",
        report.journal_size, report.journal_frames
    );
    println!();
    println!("{:<8} {:>10} {:>12}", "Kind", "Live", "Tombstones");
    for (kind, counts) in [
        ("nodes", &graph.nodes),
        ("edges", &graph.edges),
        ("atoms", &graph.atoms),
    ] {
        println!("{kind:<8} {:>10} {:>12}", counts.live, counts.tombstones);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::store_dir;
    use crate::error::CliError;

    #[test]
    fn reports_counts() {
        let dir = store_dir(3);
        let report = inspect(dir.path()).unwrap();
        assert_eq!(report.graph.nodes.live, 3);
        assert_eq!(report.graph.sequence.as_u64(), 3);
        assert!(report.journal_size > 0);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["graph"]["nodes"]["live"], 3);
    }

    #[test]
    fn missing_store() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(inspect(dir.path()), Err(CliError::NoStore(_))));
    }
}
