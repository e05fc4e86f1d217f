//! Version-vector command implementation.

use super::open_existing;
use crate::error::CliResult;
use crate::Format;
use std::fmt::Write as _;
use std::path::Path;
use weft_core::{Kind, Version};
use weft_sync_protocol::VersionMessage;

/// Reads the store's version vectors.
pub fn version(path: &Path) -> CliResult<Version> {
    let mut store = open_existing(path)?;
    let version = store.version()?;
    store.close()?;
    Ok(version)
}

/// Runs the version-vector command.
///
/// With `blob` set, prints the encoded version message as hex, as a peer
/// would receive it.
pub fn run(path: &Path, blob: bool, format: Format) -> CliResult<()> {
    let version = version(path)?;
    if blob {
        let bytes = VersionMessage::new(version).encode()?;
        println!("{}", hex(&bytes));
        return Ok(());
    }
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&version)?),
        Format::Text => {
            for kind in [Kind::Node, Kind::Edge, Kind::Atom] {
                println!("{kind}:");
                for (origin, clock) in version.get(kind).iter() {
                    println!("  {origin} clock {clock}");
                }
            }
        }
    }
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
