//! Dump-journal command implementation.

use super::read_journal;
use crate::error::CliResult;
use crate::Format;
use serde::Serialize;
use std::path::Path;
use weft_core::{journal, Store, TableCounts};

/// One journal frame.
#[derive(Debug, Serialize)]
pub struct FrameInfo {
    /// Position in the journal.
    pub index: usize,
    /// Byte offset of the frame header.
    pub offset: usize,
    /// Payload size in bytes.
    pub payload_len: usize,
    /// Commit sequence stored in the frame.
    pub sequence: u64,
    /// Origin id stored in the frame.
    pub origin: u64,
    /// Node counts.
    pub nodes: TableCounts,
    /// Edge counts.
    pub edges: TableCounts,
    /// Atom counts.
    pub atoms: TableCounts,
}

/// Decodes up to `limit` frames.
pub fn frames(path: &Path, limit: Option<usize>) -> CliResult<Vec<FrameInfo>> {
    let bytes = read_journal(path)?;
    let scan = journal::scan(&bytes)?;
    scan.frames
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(index, range)| -> CliResult<FrameInfo> {
            let store = Store::from_snapshot(&bytes[range.clone()])?;
            let stats = store.graph_stats()?;
            Ok(FrameInfo {
                index,
                offset: range.start - journal::FRAME_HEADER,
                payload_len: range.len(),
                sequence: stats.sequence.as_u64(),
                origin: store.origin().as_u64(),
                nodes: stats.nodes,
                edges: stats.edges,
                atoms: stats.atoms,
            })
        })
        .collect()
}

/// Runs the dump-journal command.
pub fn run(path: &Path, limit: Option<usize>, format: Format) -> CliResult<()> {
    let frames = frames(path, limit)?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&frames)?),
        Format::Text => {
            println!(
                "{:>5} {:>10} {:>8} {:>8} {:>16} {:>7} {:>7} {:>7}",
                "#", "offset", "bytes", "seq", "origin", "nodes", "edges", "atoms"
            );
            for frame in &frames {
                println!(
                    "{:>5} {:>10} {:>8} {:>8} {:>16x} {:>7} {:>7} {:>7}",
                    frame.index,
                    frame.offset,
                    frame.payload_len,
                    frame.sequence,
                    frame.origin,
                    frame.nodes.live,
                    frame.edges.live,
                    frame.atoms.live
                );
            }
        }
    }
    Ok(())
}
