//! Verify command implementation.

use super::read_journal;
use crate::error::{CliError, CliResult};
use std::path::Path;
use weft_core::{journal, Store};

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyReport {
    /// Number of complete frames.
    pub frames: usize,
    /// Bytes after the last complete frame.
    pub torn_bytes: usize,
    /// Sequence of the last frame.
    pub last_sequence: Option<u64>,
    /// Problems found.
    pub errors: Vec<String>,
}

impl VerifyReport {
    /// Returns true if no problems were found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks frame checksums and that every frame decodes, with increasing
/// sequence numbers.
pub fn verify(path: &Path) -> CliResult<VerifyReport> {
    let bytes = read_journal(path)?;
    let mut report = VerifyReport::default();
    let scan = match journal::scan(&bytes) {
        Ok(scan) => scan,
        Err(e) => {
            report.errors.push(e.to_string());
            return Ok(report);
        }
    };
    report.frames = scan.frames.len();
    report.torn_bytes = scan.torn_len(bytes.len());

    for (index, range) in scan.frames.iter().enumerate() {
        match Store::from_snapshot(&bytes[range.clone()]) {
            Ok(store) => {
                let sequence = store.sequence().as_u64();
                if report.last_sequence.is_some_and(|last| sequence <= last) {
                    report
                        .errors
                        .push(format!("frame {index}: sequence {sequence} does not increase"));
                }
                report.last_sequence = Some(sequence);
            }
            Err(e) => report.errors.push(format!("frame {index}: {e}")),
        }
    }
    Ok(report)
}

/// Runs the verify command.
pub fn run(path: &Path) -> CliResult<()> {
    println!("Verifying store at {}", path.display());
    let report = verify(path)?;
    println!("  Frames: {}", report.frames);
    if let Some(sequence) = report.last_sequence {
        println!("  Last sequence: {sequence}");
    }
    if report.torn_bytes > 0 {
        println!(
            "  Torn tail: {} bytes (dropped on next open)",
            report.torn_bytes
        );
    }
    for error in &report.errors {
        println!("  Error: {error}");
    }

    println!();
    if report.is_ok() {
        println!("✓ Store verification passed");
        Ok(())
    } else {
        println!("✗ Store verification failed");
        Err(CliError::VerificationFailed(format!(
            "{} problem(s) found",
            report.errors.len()
        )))
    }
}
