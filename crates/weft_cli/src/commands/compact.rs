//! Compact command implementation.

use super::open_existing;
use crate::error::CliResult;
use std::path::Path;
use tracing::info;

/// Frame counts around a compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactReport {
    /// Frames before.
    pub frames_before: usize,
    /// Frames after.
    pub frames_after: usize,
}

/// Rewrites the journal as a single frame unless `dry_run` is set.
pub fn compact(path: &Path, dry_run: bool) -> CliResult<CompactReport> {
    let mut store = open_existing(path)?;
    let frames_before = store.journal_frames();
    if !dry_run {
        store.compact()?;
    }
    let report = CompactReport {
        frames_before,
        frames_after: store.journal_frames(),
    };
    store.close()?;
    Ok(report)
}

/// Runs the compact command.
pub fn run(path: &Path, dry_run: bool) -> CliResult<()> {
    let report = compact(path, dry_run)?;
    if dry_run {
        println!(
            "Would rewrite {} frame(s) as one",
            report.frames_before
        );
    } else {
        info!(
            before = report.frames_before,
            after = report.frames_after,
            "compaction complete"
        );
        println!(
            "Compacted journal: {} frame(s) -> {}",
            report.frames_before, report.frames_after
        );
    }
    Ok(())
}
